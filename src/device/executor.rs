use crate::config::ExecutorConfig;
use crate::error::Result;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

/// Dedicated thread pool for kernel launches.
///
/// Kernels run on rayon's global pool unless they are launched inside
/// `Executor::install`.
pub struct Executor {
    pool: ThreadPool,
}

impl Executor {
    pub fn new(config: &ExecutorConfig) -> Result<Self> {
        let mut builder = ThreadPoolBuilder::new();
        if let Some(num_threads) = config.num_threads {
            builder = builder.num_threads(num_threads);
        }

        let prefix = config.thread_name.clone();
        let pool = builder
            .thread_name(move |i| format!("{}-{}", prefix, i))
            .build()?;

        debug!(
            num_threads = pool.current_num_threads(),
            thread_name = %config.thread_name,
            "executor ready"
        );

        Ok(Executor { pool })
    }

    /// Executor configured from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(&ExecutorConfig::from_env()?)
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `f` on the pool: kernels launched by `f` use its threads.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_count_and_names() {
        let config = ExecutorConfig::new().with_num_threads(2).with_thread_name("conv");
        let executor = Executor::new(&config).unwrap();
        assert_eq!(executor.num_threads(), 2);

        let name = executor.install(|| std::thread::current().name().map(str::to_string));
        assert!(name.unwrap().starts_with("conv-"));
    }
}
