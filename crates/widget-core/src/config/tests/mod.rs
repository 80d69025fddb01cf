// Configuration test modules
#[cfg(test)]
mod gate_tests;
