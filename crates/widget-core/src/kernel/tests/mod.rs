mod support;

mod bootstrap_tests;
