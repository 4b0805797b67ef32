use std::env;
use tessellate::config::NUM_THREADS_ENV;
use tessellate::prelude::*;

// Every case lives in one test: the environment is process-wide.
#[test]
fn executor_from_env() {
    env::remove_var(NUM_THREADS_ENV);
    assert_eq!(ExecutorConfig::from_env().unwrap(), ExecutorConfig::default());

    env::set_var(NUM_THREADS_ENV, "3");
    assert_eq!(ExecutorConfig::from_env().unwrap().num_threads, Some(3));
    assert_eq!(Executor::from_env().unwrap().num_threads(), 3);

    env::set_var(NUM_THREADS_ENV, "zero");
    assert!(matches!(
        ExecutorConfig::from_env(),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(Executor::from_env(), Err(Error::InvalidConfig(_))));

    env::remove_var(NUM_THREADS_ENV);
}
