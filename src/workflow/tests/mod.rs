//! Unit tests for the transition graph.

mod graph_tests;
