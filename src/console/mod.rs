use std::io::{self, BufRead, Write};

/// Line-oriented operator console.
///
/// Wraps the input and output streams used by the menu and the paged
/// browser so both can be driven by stdin/stdout or by in-memory buffers.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Console::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console { input, output }
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Writes `text` without a newline and flushes it so it shows before input is read.
    pub fn prompt(&mut self, text: &str) -> io::Result<()> {
        write!(self.output, "{}", text)?;
        self.output.flush()
    }

    /// Reads one integer from the operator.
    ///
    /// Only the first token of a line is parsed; anything after it is
    /// discarded. Unparseable lines print `retry_message` and read again.
    /// Returns `Ok(None)` once the input is exhausted.
    pub fn read_int(&mut self, retry_message: &str) -> io::Result<Option<i64>> {
        loop {
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }

            match parse_int_token(&line) {
                Some(Ok(value)) => return Ok(Some(value)),
                Some(Err(())) => writeln!(self.output, "{}", retry_message)?,
                None => continue,
            }
        }
    }
}

/// `None` for a blank line, `Some(Err(()))` when the first token is not an integer.
fn parse_int_token(line: &str) -> Option<Result<i64, ()>> {
    let token = line.split_whitespace().next()?;
    Some(token.parse::<i64>().map_err(|_| ()))
}
