use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse decimal or `0x`-prefixed hex seeds.
pub fn parse_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    if tokens.is_empty() {
        bail!("at least one seed is required");
    }
    tokens
        .iter()
        .map(|token| {
            let parsed = if let Some(hex) = token.strip_prefix("0x") {
                u64::from_str_radix(hex, 16)
            } else {
                token.parse::<u64>()
            };
            parsed.with_context(|| format!("invalid seed: {token}"))
        })
        .collect()
}

/// Report sink: a file when `--output` is given, stdout otherwise.
pub enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer().flush()
    }
}
