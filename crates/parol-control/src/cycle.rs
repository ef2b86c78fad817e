//! 控制循环
//!
//! 每个周期依次执行四个阶段：
//!
//! 1. **network**：取出通道里的消息，命令交给队列准入
//! 2. **processing**：当前没有执行中的命令时从队列取一条
//! 3. **execution**：需要时先做逆解，再让命令写入命令帧
//! 4. **serial**：发送命令帧，读取反馈并刷新机器人状态
//!
//! 每个阶段都由 [`PerformanceMonitor`] 计时，逆解的子阶段嵌套在 execution 内。

use crate::command::{ControlCommand, ControlMessage, StepContext, StepOutcome};
use crate::config::{ControllerConfig, LoopConfig};
use crate::error::ControlError;
use crate::state::RobotState;
use crossbeam_channel::{Receiver, Sender};
use parol_driver::{
    CommandId, CommandKind, CommandQueue, PerformanceMonitor, QueueError, SerialLink,
    SerialTransport,
};
use parol_kinematics::{IkRequest, IkSolver, KinematicModel};
use parol_protocol::{CommandCode, FeedbackFrame, OutboundFrame};
use parol_tools::{Clock, MonotonicClock, Phase};
use spin_sleep::SpinSleeper;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// 单个周期的执行情况
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// 通道中收到的命令数
    pub received: usize,
    pub admitted: usize,
    pub rejected: usize,
    /// 被撤销的命令数（含执行中的命令）
    pub cancelled: usize,
    /// 本周期开始执行的命令
    pub started: Option<CommandId>,
    /// 本周期执行的命令类型
    pub executing: Option<CommandKind>,
    /// 执行中的命令在本周期完成
    pub finished: bool,
    /// 本周期是否做了逆解以及是否成功
    pub ik_success: Option<bool>,
    /// 本周期解码的反馈帧数
    pub feedback_frames: usize,
}

/// 控制循环的外部句柄
///
/// 可以克隆后交给其他线程：通过通道发送消息，或直接向共享队列提交命令。
pub struct ControlHandle<C> {
    sender: Sender<ControlMessage<C>>,
    queue: Arc<CommandQueue<C>>,
    stop: Arc<AtomicBool>,
}

impl<C> Clone for ControlHandle<C> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            queue: Arc::clone(&self.queue),
            stop: Arc::clone(&self.stop),
        }
    }
}

impl<C: ControlCommand> ControlHandle<C> {
    /// 通过通道发送命令，下个周期的 network 阶段准入
    pub fn send(&self, command: C) -> Result<(), ControlError> {
        self.post(ControlMessage::Enqueue(command))
    }

    /// 直接提交到队列，立即得到准入结果
    pub fn enqueue(&self, command: C) -> Result<CommandId, QueueError> {
        self.queue.add(command)
    }

    pub fn clear_queue(&self) -> Result<(), ControlError> {
        self.post(ControlMessage::ClearQueue)
    }

    /// 撤销当前命令并清空队列
    pub fn stop_motion(&self) -> Result<(), ControlError> {
        self.post(ControlMessage::Stop)
    }

    /// 请求 [`ControlLoop::run`] 在当前周期结束后退出
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn queue(&self) -> &Arc<CommandQueue<C>> {
        &self.queue
    }

    fn post(&self, message: ControlMessage<C>) -> Result<(), ControlError> {
        self.sender
            .send(message)
            .map_err(|_| ControlError::ChannelClosed)
    }
}

/// 控制循环
pub struct ControlLoop<M, T, C, K = MonotonicClock> {
    config: LoopConfig,
    solver: IkSolver<M>,
    link: SerialLink<T>,
    monitor: PerformanceMonitor<K>,
    queue: Arc<CommandQueue<C>>,
    inbox: Receiver<ControlMessage<C>>,
    sender: Sender<ControlMessage<C>>,
    stop: Arc<AtomicBool>,
    feedback: FeedbackFrame,
    state: RobotState,
    outbound: OutboundFrame,
    active: Option<C>,
    cycles: u64,
}

impl<M, T, C> ControlLoop<M, T, C, MonotonicClock>
where
    M: KinematicModel,
    T: SerialTransport,
    C: ControlCommand,
{
    pub fn new(config: &ControllerConfig, model: M, transport: T) -> Result<Self, ControlError> {
        Self::with_clock(config, model, transport, MonotonicClock::new())
    }
}

impl<M, T, C, K> ControlLoop<M, T, C, K>
where
    M: KinematicModel,
    T: SerialTransport,
    C: ControlCommand,
    K: Clock,
{
    /// 使用指定时钟创建控制循环（时钟只用于性能监控）
    pub fn with_clock(
        config: &ControllerConfig,
        model: M,
        transport: T,
        clock: K,
    ) -> Result<Self, ControlError> {
        config.validate()?;

        let feedback = FeedbackFrame::default();
        let state = RobotState::from_feedback(&feedback, &model);
        let (sender, inbox) = crossbeam_channel::unbounded();

        Ok(Self {
            config: config.control_loop,
            solver: IkSolver::new(model, config.ik),
            link: SerialLink::new(transport),
            monitor: PerformanceMonitor::with_clock(config.monitor.clone(), clock),
            queue: Arc::new(CommandQueue::new(config.queue)),
            inbox,
            sender,
            stop: Arc::new(AtomicBool::new(false)),
            feedback,
            state,
            outbound: OutboundFrame::default(),
            active: None,
            cycles: 0,
        })
    }

    /// 替换逆解器（例如加上关节限位检查）
    pub fn map_solver(mut self, f: impl FnOnce(IkSolver<M>) -> IkSolver<M>) -> Self {
        self.solver = f(self.solver);
        self
    }

    pub fn handle(&self) -> ControlHandle<C> {
        ControlHandle {
            sender: self.sender.clone(),
            queue: Arc::clone(&self.queue),
            stop: Arc::clone(&self.stop),
        }
    }

    pub fn queue(&self) -> &Arc<CommandQueue<C>> {
        &self.queue
    }

    /// 最近一次反馈对应的机器人状态
    pub fn state(&self) -> &RobotState {
        &self.state
    }

    pub fn monitor(&self) -> &PerformanceMonitor<K> {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut PerformanceMonitor<K> {
        &mut self.monitor
    }

    pub fn solver(&self) -> &IkSolver<M> {
        &self.solver
    }

    pub fn link(&self) -> &SerialLink<T> {
        &self.link
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.link.transport_mut()
    }

    /// 上一个周期发送的命令帧
    pub fn outbound(&self) -> &OutboundFrame {
        &self.outbound
    }

    /// 是否没有执行中的命令且队列为空
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// 撤销当前命令并清空队列，返回被撤销的命令数
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.cancel_active() + self.cancel_queued();
        self.outbound.command = CommandCode::Idle;
        cancelled
    }

    /// 执行一个控制周期
    ///
    /// 串口错误在周期计时结束后返回；其余异常（准入拒绝、逆解失败、失步）
    /// 只记录日志和计数。
    pub fn run_cycle(&mut self) -> Result<CycleReport, ControlError> {
        let mut report = CycleReport::default();
        self.monitor.start_cycle();

        self.monitor.start_phase(Phase::Network);
        self.drain_inbox(&mut report);
        self.monitor.end_phase(Phase::Network);

        self.monitor.start_phase(Phase::Processing);
        if self.active.is_none()
            && let Some((id, command)) = self.queue.pop_with_id()
        {
            debug!("Executing {} command {}", command.kind(), id);
            report.started = Some(id);
            self.active = Some(command);
        }
        self.monitor.end_phase(Phase::Processing);

        self.monitor.start_phase(Phase::Execution);
        self.execute_active(&mut report);
        self.monitor.end_phase(Phase::Execution);

        self.monitor.start_phase(Phase::Serial);
        let serial = self.exchange_serial(&mut report);
        self.monitor.end_phase(Phase::Serial);

        self.monitor.end_cycle();
        self.cycles += 1;

        serial.map(|()| report)
    }

    /// 按配置频率运行，直到收到停止请求、达到最大周期数或发生不可恢复的错误
    ///
    /// 返回本次运行的周期数。
    pub fn run(&mut self) -> Result<u64, ControlError> {
        let period = Duration::from_secs_f64(1.0 / self.config.frequency_hz);
        let sleeper = SpinSleeper::default();
        let first_cycle = self.cycles;

        info!(
            "Control loop started: {} Hz, max_iterations={:?}",
            self.config.frequency_hz, self.config.max_iterations
        );

        loop {
            if self.stop.load(Ordering::Acquire) {
                info!("Control loop stop requested");
                break;
            }
            if let Some(max) = self.config.max_iterations
                && self.cycles - first_cycle >= max
            {
                break;
            }

            let started = Instant::now();
            match self.run_cycle() {
                Ok(_) => {},
                Err(e) if e.is_recoverable() => {
                    warn!("Control cycle error: {}", e);
                },
                Err(e) => {
                    error!("Control loop aborted: {}", e);
                    return Err(e);
                },
            }

            if let Some(remaining) = period.checked_sub(started.elapsed()) {
                sleeper.sleep(remaining);
            }
        }

        let ran = self.cycles - first_cycle;
        info!("Control loop stopped after {} cycles", ran);
        if self.monitor.is_detailed() {
            self.monitor.log_summary();
        }
        Ok(ran)
    }

    fn drain_inbox(&mut self, report: &mut CycleReport) {
        while let Ok(message) = self.inbox.try_recv() {
            match message {
                ControlMessage::Enqueue(command) => {
                    report.received += 1;
                    match self.queue.add(command) {
                        Ok(_) => report.admitted += 1,
                        Err(_) => report.rejected += 1,
                    }
                },
                ControlMessage::ClearQueue => {
                    report.cancelled += self.cancel_queued();
                },
                ControlMessage::Stop => {
                    report.cancelled += self.cancel_all();
                },
            }
        }
    }

    fn execute_active(&mut self, report: &mut CycleReport) {
        let Some(command) = self.active.as_mut() else {
            self.outbound.command = CommandCode::Idle;
            return;
        };
        report.executing = Some(command.kind());

        let ik = command.motion_target(&self.state).map(|target| {
            let request = IkRequest::new(target.pose, *self.state.joint_rad())
                .with_current_pose(*self.state.tcp_pose())
                .jogging(target.jogging);
            self.solver.solve(&request, &mut self.monitor)
        });

        let target_steps = ik
            .as_ref()
            .and_then(|result| result.solution.as_ref())
            .map(|q| self.solver.model().rad_to_steps(q));

        if let Some(result) = &ik {
            report.ik_success = Some(result.success);
            if !result.success {
                debug!(
                    "IK failed for {} command: residual={:.3e}, violations={}",
                    command.kind(),
                    result.residual,
                    result.violations.len()
                );
            }
        }

        let mut cx = StepContext {
            state: &self.state,
            ik: ik.as_ref(),
            target_steps,
            frame: &mut self.outbound,
        };
        if command.step(&mut cx) == StepOutcome::Finished {
            debug!("{} command finished", command.kind());
            self.active = None;
            report.finished = true;
        }
    }

    fn exchange_serial(&mut self, report: &mut CycleReport) -> Result<(), ControlError> {
        self.link.send_frame(&mut self.outbound)?;

        let frames = self.link.receive_packets(&mut self.feedback)?;
        report.feedback_frames = frames;
        if frames > 0 {
            self.state = RobotState::from_feedback(&self.feedback, self.solver.model());
        }
        Ok(())
    }

    fn cancel_active(&mut self) -> usize {
        let Some(mut command) = self.active.take() else {
            return 0;
        };
        if let Err(e) = command.on_cancel() {
            error!("Cancel callback failed for active {} command: {}", command.kind(), e);
        }
        1
    }

    fn cancel_queued(&mut self) -> usize {
        self.queue.clear(|mut command| command.on_cancel())
    }
}
