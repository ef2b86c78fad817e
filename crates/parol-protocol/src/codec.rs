//! 字节级编解码工具
//!
//! 控制板使用 24 位（关节）和 16 位（夹爪）大端有符号整数，
//! 以及高位在前的 8 位位域。

const I24_SIGN: i32 = 1 << 23;
const I24_MODULUS: i32 = 1 << 24;
const I16_SIGN: i32 = 1 << 15;
const I16_MODULUS: i32 = 1 << 16;

/// 将整数截断为低 24 位，按大端拆成 3 字节
///
/// 负数按二进制补码截断，`fuse_3_bytes` 可以还原 [-2²³, 2²³) 内的值。
pub fn split_to_3_bytes(value: i32) -> [u8; 3] {
    let [_, b0, b1, b2] = (value & 0x00FF_FFFF).to_be_bytes();
    [b0, b1, b2]
}

/// 将 3 个大端字节合成为有符号 24 位整数
pub fn fuse_3_bytes(bytes: [u8; 3]) -> i32 {
    let raw = i32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]);
    if raw >= I24_SIGN { raw - I24_MODULUS } else { raw }
}

/// 将整数截断为低 16 位，按大端拆成 2 字节
pub fn split_to_2_bytes(value: i32) -> [u8; 2] {
    let [_, _, b0, b1] = (value & 0xFFFF).to_be_bytes();
    [b0, b1]
}

/// 将 2 个大端字节合成为有符号 16 位整数
pub fn fuse_2_bytes(bytes: [u8; 2]) -> i32 {
    let raw = i32::from(u16::from_be_bytes(bytes));
    if raw >= I16_SIGN { raw - I16_MODULUS } else { raw }
}

/// 将字节拆为 8 个位，最高位在前
pub fn split_to_bitfield(byte: u8) -> [bool; 8] {
    std::array::from_fn(|i| byte & (0x80 >> i) != 0)
}

/// 将 8 个位（最高位在前）合成为字节
pub fn fuse_bitfield_to_byte(bits: &[bool; 8]) -> u8 {
    bits.iter().fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit))
}
