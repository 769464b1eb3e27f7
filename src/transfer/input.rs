//! Interactive input collection and validation.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

use crate::stacks::address::{is_valid_address_format, StacksAddress};
use crate::stacks::types::StacksNetwork;

pub const RECIPIENT_PROMPT: &str = "Enter recipient address: ";
pub const AMOUNT_PROMPT: &str = "Enter amount to transfer: ";

/// Rejected user input.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Invalid address format. Must start with '{prefix}' for {network}")]
    MissingNetworkPrefix {
        prefix: &'static str,
        network: StacksNetwork,
    },

    #[error("Invalid Stacks address format")]
    InvalidAddress,

    #[error("Amount must be a positive integer")]
    InvalidAmount,

    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),
}

/// Validate a recipient address for `network`.
///
/// Fails when the address is empty, lacks the network prefix, or is not
/// well-formed c32check.
pub fn validate_recipient_address(
    address: &str,
    network: StacksNetwork,
) -> Result<StacksAddress, InputError> {
    let prefix = network.address_prefix();
    if address.is_empty() || !address.starts_with(prefix) {
        return Err(InputError::MissingNetworkPrefix { prefix, network });
    }
    if !is_valid_address_format(address) {
        return Err(InputError::InvalidAddress);
    }
    address.parse().map_err(|_| InputError::InvalidAddress)
}

/// Whether `input` is a positive integer amount.
pub fn validate_amount(input: &str) -> bool {
    parse_amount(input).is_ok()
}

/// Parse a positive integer amount of token base units.
///
/// Surrounding whitespace is ignored; anything else that is not a plain
/// decimal integer in `1..=u128::MAX` is rejected.
pub fn parse_amount(input: &str) -> Result<u128, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InputError::InvalidAmount);
    }
    match trimmed.parse::<u128>() {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(InputError::InvalidAmount),
    }
}

/// Line-oriented prompt reader.
pub struct Prompter<R, W> {
    reader: R,
    writer: W,
}

impl Prompter<BufReader<Stdin>, Stdout> {
    /// Prompt on stdout, read from stdin.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Prompter<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Write `prompt` and read one line, without its line terminator.
    pub async fn ask(&mut self, prompt: &str) -> io::Result<String> {
        self.writer.write_all(prompt.as_bytes()).await?;
        self.writer.flush().await?;

        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

/// Ask for the recipient and amount, validating each answer before moving on.
pub async fn collect_input<R, W>(
    prompter: &mut Prompter<R, W>,
    network: StacksNetwork,
) -> Result<(StacksAddress, u128), InputError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let recipient = prompter.ask(RECIPIENT_PROMPT).await?;
    let recipient = validate_recipient_address(&recipient, network)?;

    let amount = prompter.ask(AMOUNT_PROMPT).await?;
    let amount = parse_amount(&amount)?;

    Ok((recipient, amount))
}
