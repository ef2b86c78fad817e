//! 命令队列属性测试
//!
//! 随机操作序列下，队列长度与轨迹类计数始终与参照模型一致且不越界。

use parol_driver::{CommandKind, CommandQueue, QueueConfig, QueueError, QueuedCommand};
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cmd {
    seq: u32,
    trajectory: bool,
}

impl QueuedCommand for Cmd {
    fn kind(&self) -> CommandKind {
        if self.trajectory {
            CommandKind::SmoothSpline
        } else {
            CommandKind::Other("MoveJoint")
        }
    }
}

#[derive(Debug, Clone)]
enum Op {
    Add(bool),
    Pop,
    RemoveOldest,
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => any::<bool>().prop_map(Op::Add),
        3 => Just(Op::Pop),
        1 => Just(Op::RemoveOldest),
        1 => Just(Op::Clear),
    ]
}

proptest! {
    #[test]
    fn test_queue_matches_model(
        max_size in 1usize..12,
        max_trajectory in 0usize..6,
        ops in prop::collection::vec(op_strategy(), 0..200),
    ) {
        let queue = CommandQueue::new(QueueConfig {
            max_size,
            max_trajectory_commands: max_trajectory,
        });
        let mut model: VecDeque<(parol_driver::CommandId, Cmd)> = VecDeque::new();
        let mut peak = 0usize;
        let mut seq = 0u32;

        for op in ops {
            match op {
                Op::Add(trajectory) => {
                    seq += 1;
                    let cmd = Cmd { seq, trajectory };
                    let traj_in_model = model.iter().filter(|(_, c)| c.trajectory).count();
                    let result = queue.add(cmd);
                    if model.len() >= max_size {
                        prop_assert_eq!(result, Err(QueueError::Full { max_size }));
                    } else if trajectory && traj_in_model >= max_trajectory {
                        prop_assert_eq!(result, Err(QueueError::TrajectoryLimit { max: max_trajectory }));
                    } else {
                        let id = result.expect("admission should succeed");
                        model.push_back((id, cmd));
                    }
                },
                Op::Pop => {
                    let expected = model.pop_front().map(|(_, c)| c);
                    prop_assert_eq!(queue.pop(), expected);
                },
                Op::RemoveOldest => {
                    if let Some((id, cmd)) = model.pop_front() {
                        prop_assert_eq!(queue.remove(id), Some(cmd));
                        prop_assert_eq!(queue.remove(id), None);
                    }
                },
                Op::Clear => {
                    let mut cancelled = Vec::new();
                    let count = queue.clear(|c| {
                        cancelled.push(c);
                        Ok::<(), String>(())
                    });
                    let expected: Vec<Cmd> = model.drain(..).map(|(_, c)| c).collect();
                    prop_assert_eq!(count, expected.len());
                    prop_assert_eq!(cancelled, expected);
                },
            }

            peak = peak.max(model.len());
            let stats = queue.stats();
            prop_assert_eq!(stats.current_size, model.len());
            prop_assert_eq!(
                stats.trajectory_count,
                model.iter().filter(|(_, c)| c.trajectory).count()
            );
            prop_assert!(stats.current_size <= max_size);
            prop_assert!(stats.trajectory_count <= max_trajectory);
            prop_assert_eq!(stats.peak_size, peak);
            prop_assert_eq!(stats.available_slots, max_size - model.len());
        }
    }
}

#[test]
fn test_max_size_three_example() {
    let queue = CommandQueue::new(QueueConfig {
        max_size: 3,
        max_trajectory_commands: 10,
    });
    let cmd = |seq| Cmd {
        seq,
        trajectory: false,
    };

    assert!(queue.add(cmd(1)).is_ok());
    assert!(queue.add(cmd(2)).is_ok());
    assert!(queue.add(cmd(3)).is_ok());
    assert_eq!(queue.add(cmd(4)), Err(QueueError::Full { max_size: 3 }));
    assert_eq!(queue.stats().total_dropped, 1);

    assert_eq!(queue.pop().map(|c| c.seq), Some(1));
    assert!(queue.add(cmd(4)).is_ok());
    assert_eq!(queue.len(), 3);
}

#[test]
fn test_concurrent_producers_respect_limits() {
    let queue = Arc::new(CommandQueue::new(QueueConfig {
        max_size: 50,
        max_trajectory_commands: 5,
    }));

    let producers: Vec<_> = (0..4)
        .map(|t| {
            let q = Arc::clone(&queue);
            thread::spawn(move || {
                let mut accepted = 0u32;
                for i in 0..100 {
                    let cmd = Cmd {
                        seq: t * 1000 + i,
                        trajectory: i % 3 == 0,
                    };
                    if q.add(cmd).is_ok() {
                        accepted += 1;
                    }
                }
                accepted
            })
        })
        .collect();

    let consumer = {
        let q = Arc::clone(&queue);
        thread::spawn(move || {
            let mut popped = 0u32;
            for _ in 0..2000 {
                if q.pop().is_some() {
                    popped += 1;
                }
                let stats = q.stats();
                assert!(stats.current_size <= 50);
                assert!(stats.trajectory_count <= 5);
            }
            popped
        })
    };

    let accepted: u32 = producers.into_iter().map(|h| h.join().unwrap()).sum();
    let popped = consumer.join().unwrap();

    let stats = queue.stats();
    assert_eq!(accepted as usize, popped as usize + stats.current_size);
    assert_eq!(stats.total_queued, accepted as u64);
    assert_eq!(stats.total_queued + stats.total_dropped, 400);
    assert!(stats.peak_size <= 50);
}
