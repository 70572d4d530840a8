use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

use log::{error, warn};

/// A basic thread pool with a constant number of threads.
pub struct ThreadPool {
    workers: Vec<Worker>,
    sender: mpsc::Sender<Message>,
}

/// A job for a thread pool. The job may run on any thread, and will only be run once.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// A message to a thread.
enum Message {
    /// A new job to run.
    NewJob(Job),
    /// Message to tell the thread to return.
    Terminate,
}

impl ThreadPool {
    /// Creates a pool with the given number of named threads. At least one thread is always started.
    pub fn new(name: &str, size: usize) -> std::io::Result<ThreadPool> {
        let (sender, receiver) = mpsc::channel();

        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size.max(1))
            .map(|id| new_worker(format!("{}-{}", name, id), Arc::clone(&receiver)))
            .collect::<std::io::Result<Vec<Worker>>>()?;

        Ok(ThreadPool { workers, sender })
    }

    /// Number of threads in the pool.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Executes the given closure on a thread.
    pub fn execute<F>(&self, f: F)
        where
            F: FnOnce() + Send + 'static,
    {
        if self.sender.send(Message::NewJob(Box::new(f))).is_err() {
            error!("Thread pool has no running workers, dropping job");
        }
    }
}

impl Drop for ThreadPool {
    /// Sends the termination message to all threads in the thread pool and waits for them to return.
    fn drop(&mut self) {
        for _ in &self.workers {
            let _ = self.sender.send(Message::Terminate);
        }

        for worker in &mut self.workers {
            if let Some(thread) = worker.take() {
                if thread.join().is_err() {
                    warn!("Worker thread panicked while shutting down");
                }
            }
        }
    }
}

/// A worker, represented by a join handler if the thread is still running, or None.
type Worker = Option<thread::JoinHandle<()>>;

/// Creates a new worker with the given receiver end of an mpsc channel.
/// The worker will run until a Terminate message is sent to it through the channel. A panicking job is logged
/// and does not take the worker down with it.
fn new_worker(name: String, receiver: Arc<Mutex<mpsc::Receiver<Message>>>) -> std::io::Result<Worker> {
    let thread = thread::Builder::new().name(name).spawn(move || loop {
        let message = match receiver.lock() {
            Ok(receiver) => receiver.recv(),
            Err(_) => break,
        };

        match message {
            Ok(Message::NewJob(job)) => {
                if catch_unwind(AssertUnwindSafe(job)).is_err() {
                    error!("Job panicked on {}", thread::current().name().unwrap_or("worker"));
                }
            }
            Ok(Message::Terminate) | Err(_) => break
        }
    })?;

    Ok(Some(thread))
}
