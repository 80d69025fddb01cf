// Routing test module
#[cfg(test)]
mod support;
#[cfg(test)]
mod args_tests;
