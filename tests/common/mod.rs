#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::session::{RunError, Session};

/// In-memory `print` sink that stays readable after being handed to the
/// interpreter.
#[derive(Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output is UTF-8")
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn session() -> (Session, Capture) {
    let capture = Capture::default();
    let session = Session::with_output(Box::new(capture.clone()));
    (session, capture)
}

/// Run `source` in a fresh session, returning printed output and the outcome.
pub fn run(source: &str) -> (String, Result<(), RunError>) {
    let (mut session, capture) = session();
    let result = session.run(source);
    (capture.contents(), result)
}

/// Run `source`, asserting it succeeds, and return what it printed.
pub fn output_of(source: &str) -> String {
    let (out, result) = run(source);
    if let Err(e) = result {
        panic!("program failed: {:?}\noutput so far:\n{}", e, out);
    }
    out
}

/// Messages of the static errors `source` produces.
pub fn static_errors(source: &str) -> Vec<String> {
    match run(source).1 {
        Err(RunError::Static(errors)) => errors.iter().map(|e| e.to_string()).collect(),
        other => panic!("expected static errors, got {:?}", other),
    }
}
