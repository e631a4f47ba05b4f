use std::io::{self, Cursor, Read, Stderr, Stdin, Stdout, Write};

/// Console streams behind a trait so CLI commands can be run against
/// in-memory buffers.
pub trait ConsoleIO {
    type In: Read;
    type Out: Write;
    type Err: Write;

    fn stdin(&mut self) -> &mut Self::In;
    fn stdout(&mut self) -> &mut Self::Out;
    fn stderr(&mut self) -> &mut Self::Err;

    /// Read all of stdin, trimming surrounding whitespace.
    fn read_input(&mut self) -> io::Result<String> {
        let mut buf = String::new();
        self.stdin().read_to_string(&mut buf)?;
        Ok(buf.trim().to_string())
    }
}

/// The process's real stdin, stdout and stderr.
pub struct StdIO {
    stdin: Stdin,
    stdout: Stdout,
    stderr: Stderr,
}

impl StdIO {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: io::stdout(),
            stderr: io::stderr(),
        }
    }
}

impl Default for StdIO {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleIO for StdIO {
    type In = Stdin;
    type Out = Stdout;
    type Err = Stderr;

    fn stdin(&mut self) -> &mut Stdin {
        &mut self.stdin
    }

    fn stdout(&mut self) -> &mut Stdout {
        &mut self.stdout
    }

    fn stderr(&mut self) -> &mut Stderr {
        &mut self.stderr
    }
}

/// In-memory streams: canned stdin, captured stdout and stderr.
#[derive(Default)]
pub struct BufferedIO {
    stdin: Cursor<Vec<u8>>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl BufferedIO {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_stdin(data: &[u8]) -> Self {
        Self {
            stdin: Cursor::new(data.to_vec()),
            ..Self::default()
        }
    }

    pub fn stdout_to_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_to_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

impl ConsoleIO for BufferedIO {
    type In = Cursor<Vec<u8>>;
    type Out = Vec<u8>;
    type Err = Vec<u8>;

    fn stdin(&mut self) -> &mut Cursor<Vec<u8>> {
        &mut self.stdin
    }

    fn stdout(&mut self) -> &mut Vec<u8> {
        &mut self.stdout
    }

    fn stderr(&mut self) -> &mut Vec<u8> {
        &mut self.stderr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_io_captures_both_streams() {
        let mut io = BufferedIO::new();
        writeln!(io.stdout(), "answer").unwrap();
        writeln!(io.stderr(), "warning").unwrap();
        assert_eq!(io.stdout_to_string(), "answer\n");
        assert_eq!(io.stderr_to_string(), "warning\n");
    }

    #[test]
    fn read_input_trims() {
        let mut io = BufferedIO::with_stdin(b"  What is Claude?\n");
        assert_eq!(io.read_input().unwrap(), "What is Claude?");
    }

    #[test]
    fn read_input_of_empty_stdin() {
        let mut io = BufferedIO::new();
        assert_eq!(io.read_input().unwrap(), "");
    }
}
