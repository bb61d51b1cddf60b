//! Line input from stdin

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio_stream::{StreamExt, wrappers::LinesStream};

pub struct Input {
    lines: LinesStream<BufReader<Stdin>>,
}

impl Input {
    pub fn stdin() -> Self {
        Self {
            lines: LinesStream::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// Print `prompt` and wait for a line; `None` at end of input
    pub async fn prompt(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        print!("{prompt} ");
        std::io::stdout().flush()?;
        Ok(self.lines.next().await.transpose()?)
    }
}
