use log::error;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinSet};

const MAILBOX_CAPACITY: usize = 16;

/// A stateful task that processes its messages sequentially on a single
/// event loop. All state owned by the actor is therefore mutated without
/// further synchronization.
pub trait Actor: Sized + Send + 'static {
    type Message: Send + 'static;
    type Options;
    type Error: From<mpsc::error::SendError<Self::Message>>
        + std::fmt::Display
        + Send
        + 'static;

    fn new(options: Self::Options) -> Self;

    /// Invoked once before the first message is processed.
    fn start(&mut self, _ctx: &mut ActorContext<Self>) {}

    /// Processes one message and decides whether the event loop continues.
    /// This method must not block; long-running or fallible async work
    /// belongs in tasks spawned via [`ActorContext::spawn`].
    fn receive(&mut self, ctx: &mut ActorContext<Self>, message: Self::Message) -> ActorAction;

    /// Invoked once after the event loop has ended.
    /// Tasks spawned by the actor are aborted when the context is dropped,
    /// immediately after this method returns.
    fn stop(self) {}
}

pub enum ActorAction {
    Continue,
    Stop,
}

pub struct ActorContext<T: Actor> {
    handle: ActorHandle<T>,
    /// Async work spawned while processing messages.
    /// Outstanding tasks are aborted when the context is dropped.
    tasks: JoinSet<Result<(), T::Error>>,
}

impl<T: Actor> ActorContext<T> {
    fn new(handle: &ActorHandle<T>) -> Self {
        Self {
            handle: handle.clone(),
            tasks: JoinSet::new(),
        }
    }

    pub fn handle(&self) -> &ActorHandle<T> {
        &self.handle
    }

    pub fn spawn(
        &mut self,
        task: impl std::future::Future<Output = Result<(), T::Error>> + Send + 'static,
    ) -> AbortHandle {
        self.tasks.spawn(task)
    }

    /// Joins tasks that have completed since the last call and logs their
    /// unhandled errors. A task that wants its error acted upon should send
    /// the actor a message instead of returning the error.
    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("actor task failed: {e}"),
                Err(e) if e.is_cancelled() => {}
                Err(e) => error!("failed to join actor task: {e}"),
            }
        }
    }
}

pub struct ActorHandle<T: Actor> {
    sender: mpsc::Sender<T::Message>,
    stopped: watch::Receiver<bool>,
}

impl<T: Actor> Clone for ActorHandle<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            stopped: self.stopped.clone(),
        }
    }
}

impl<T: Actor> ActorHandle<T> {
    /// Creates the actor and runs its event loop as a detached task.
    /// The task ends when the actor returns [`ActorAction::Stop`] or when
    /// all handles have been dropped and the mailbox has drained.
    pub fn new(options: T::Options) -> Self {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let (stopped_tx, stopped_rx) = watch::channel(false);
        let handle = Self {
            sender: tx,
            stopped: stopped_rx,
        };
        let runner = ActorRunner {
            actor: T::new(options),
            ctx: ActorContext::new(&handle),
            receiver: rx,
            stopped: stopped_tx,
        };
        tokio::spawn(runner.run());
        handle
    }

    pub async fn send(&self, message: T::Message) -> Result<(), T::Error> {
        self.sender.send(message).await.map_err(T::Error::from)
    }

    /// Waits until the actor event loop has ended.
    pub async fn wait_for_stop(mut self) {
        // A receive error means the sender side is gone, which also implies
        // that the actor has stopped.
        let _ = self.stopped.wait_for(|stopped| *stopped).await;
    }
}

struct ActorRunner<T: Actor> {
    actor: T,
    ctx: ActorContext<T>,
    receiver: mpsc::Receiver<T::Message>,
    stopped: watch::Sender<bool>,
}

impl<T: Actor> ActorRunner<T> {
    async fn run(mut self) {
        self.actor.start(&mut self.ctx);
        while let Some(message) = self.receiver.recv().await {
            let action = self.actor.receive(&mut self.ctx, message);
            self.ctx.reap();
            match action {
                ActorAction::Continue => {}
                ActorAction::Stop => break,
            }
        }
        self.actor.stop();
        let _ = self.stopped.send(true);
    }
}
