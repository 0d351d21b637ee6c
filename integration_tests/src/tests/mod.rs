pub use proving_period_test::*;
