/// Basic thread pool utility.
pub mod thread_pool;

/// In-memory stream for testing connections.
#[cfg(test)]
pub mod mock;
