//! Integration test harness for end-to-end dwq execution.
//!
//! Wraps the full pipeline: build the vocabulary, load a synthetic
//! debug-info dump, compile a query, run it, and hand back the result
//! stacks (or their rendered tops, which is what most assertions want).

use dwq_dw::DwHandle;
use dwq_engine::{compile, Error, Stack, Vocabulary};

pub struct TestHarness {
    voc: Vocabulary,
    file: Option<DwHandle>,
}

impl TestHarness {
    /// A harness with the full vocabulary and no input file; queries
    /// start on an empty stack.
    pub fn new() -> Self {
        Self {
            voc: dwq_dw::full_voc(),
            file: None,
        }
    }

    /// A harness whose queries start on a stack holding the given dump.
    pub fn with_dump(json: &str) -> Self {
        let file = dwq_dw::load_str(json, "test.dwj").expect("dump should load");
        Self {
            voc: dwq_dw::full_voc(),
            file: Some(file),
        }
    }

    fn initial_stack(&self) -> Stack {
        let mut stack = Stack::new();
        if let Some(file) = &self.file {
            stack.push(dwq_dw::dwarf_value(file.clone()));
        }
        stack
    }

    /// Compile and run, collecting all result stacks.
    ///
    /// # Panics
    ///
    /// Panics if compilation or execution fails.
    pub fn run(&self, query: &str) -> Vec<Stack> {
        let query = compile(query, &self.voc).expect("query should compile");
        query
            .run(self.initial_stack())
            .collect::<Result<Vec<_>, _>>()
            .expect("query should run")
    }

    /// Rendered top-of-stack of every result.
    pub fn tops(&self, query: &str) -> Vec<String> {
        self.run(query)
            .iter()
            .map(|stk| {
                stk.top()
                    .expect("result stack should be non-empty")
                    .to_string()
            })
            .collect()
    }

    /// Whole stacks rendered bottom-to-top.
    pub fn stacks(&self, query: &str) -> Vec<Vec<String>> {
        self.run(query)
            .iter()
            .map(|stk| stk.values().iter().map(|v| v.to_string()).collect())
            .collect()
    }

    /// Run a query expected to abort, returning the fatal error.
    pub fn run_err(&self, query: &str) -> Error {
        let query = compile(query, &self.voc).expect("query should compile");
        query
            .run(self.initial_stack())
            .collect::<Result<Vec<_>, _>>()
            .expect_err("query should abort")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
