// Cross-module tests driving a whole application through its router
mod integration;
