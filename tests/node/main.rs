// Node integration tests

mod runner_test;
