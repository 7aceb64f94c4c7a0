//! Test suites for the front-end start-up sequence.

mod support;
