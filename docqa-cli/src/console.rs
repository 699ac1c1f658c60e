//! The interactive question loop behind `docqa-chat`.
//!
//! Input comes from a [`LineSource`] and answers from an [`Answerer`], so the
//! loop runs the same against a terminal and against scripted input. Ctrl-C
//! while an answer is pending arrives as a signal rather than a key press and
//! is observed through the `interrupt` future given to [`run_console`].

use std::collections::VecDeque;
use std::future::Future;
use std::io::Write;

use async_trait::async_trait;
use docqa_rag::QaPipeline;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{error, info, warn};

const BANNER: &str = "=== Chat de Perguntas e Respostas ===";
const PROMPT: &str = "Faça sua pergunta: ";
const EXIT_HINT: &str = "Digite 'sair' ou 'quit' para encerrar o chat.";
const EMPTY_HINT: &str = "Por favor, digite uma pergunta válida.";
const INTERRUPTED: &str = "\n\nChat interrompido pelo usuário. Até logo!";
const GOODBYE: &str = "\nEncerrando o chat. Até logo!";
const EXIT_KEYWORDS: [&str; 4] = ["sair", "quit", "exit", "q"];

/// One read from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// A line of text, without the trailing newline.
    Line(String),
    /// Ctrl-C.
    Interrupted,
    /// Ctrl-D or end of input.
    Eof,
}

/// Where the loop reads questions from.
pub trait LineSource {
    /// Show `prompt` and read one line.
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<ConsoleInput>;
}

/// A [`LineSource`] backed by a rustyline editor with history.
pub struct EditorInput {
    editor: DefaultEditor,
}

impl EditorInput {
    /// Open the terminal editor.
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self { editor: DefaultEditor::new()? })
    }
}

impl LineSource for EditorInput {
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<ConsoleInput> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(ConsoleInput::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ConsoleInput::Interrupted),
            Err(ReadlineError::Eof) => Ok(ConsoleInput::Eof),
            Err(e) => Err(e.into()),
        }
    }
}

/// A [`LineSource`] that replays fixed inputs, then reports end of input.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    inputs: VecDeque<ConsoleInput>,
}

impl ScriptedInput {
    /// Replay `lines` as typed lines.
    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { inputs: lines.into_iter().map(|l| ConsoleInput::Line(l.into())).collect() }
    }

    /// Append a raw input event.
    pub fn then(mut self, input: ConsoleInput) -> Self {
        self.inputs.push_back(input);
        self
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> anyhow::Result<ConsoleInput> {
        Ok(self.inputs.pop_front().unwrap_or(ConsoleInput::Eof))
    }
}

/// Anything that turns a question into answer text.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Answer one question.
    async fn answer(&self, question: &str) -> docqa_rag::Result<String>;
}

#[async_trait]
impl Answerer for QaPipeline {
    async fn answer(&self, question: &str) -> docqa_rag::Result<String> {
        Ok(self.ask(question).await?.text)
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The user typed an exit keyword.
    Keyword,
    /// Ctrl-C.
    Interrupted,
    /// End of input.
    Eof,
}

fn is_exit_keyword(input: &str) -> bool {
    let input = input.to_lowercase();
    EXIT_KEYWORDS.contains(&input.as_str())
}

/// Resolve on the first SIGINT (Ctrl-C outside the line editor).
///
/// If the handler cannot be installed the failure is logged and the future
/// never resolves, leaving the default signal behaviour in place.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Read questions until an exit keyword, Ctrl-C or end of input.
///
/// A failed question is reported to `out` and the loop keeps going; only
/// terminal and output errors end it early. A question still being answered
/// when `interrupt` resolves is abandoned and the loop exits as
/// [`ExitReason::Interrupted`].
pub async fn run_console<S, A, W, I>(
    input: &mut S,
    answerer: &A,
    out: &mut W,
    interrupt: I,
) -> anyhow::Result<ExitReason>
where
    S: LineSource + ?Sized,
    A: Answerer + ?Sized,
    W: Write + ?Sized,
    I: Future<Output = ()>,
{
    tokio::pin!(interrupt);

    writeln!(out, "{BANNER}")?;
    writeln!(out, "{EXIT_HINT}\n")?;

    loop {
        out.flush()?;
        let question = match input.read_line(PROMPT)? {
            ConsoleInput::Line(line) => line.trim().to_string(),
            ConsoleInput::Interrupted => {
                writeln!(out, "{INTERRUPTED}")?;
                return Ok(ExitReason::Interrupted);
            }
            ConsoleInput::Eof => {
                writeln!(out, "{GOODBYE}")?;
                return Ok(ExitReason::Eof);
            }
        };

        if is_exit_keyword(&question) {
            writeln!(out, "{GOODBYE}")?;
            return Ok(ExitReason::Keyword);
        }
        if question.is_empty() {
            writeln!(out, "{EMPTY_HINT}\n")?;
            continue;
        }

        writeln!(out, "\nPERGUNTA: {question}")?;
        writeln!(out, "Buscando resposta...")?;
        out.flush()?;

        let outcome = tokio::select! {
            outcome = answerer.answer(&question) => outcome,
            _ = &mut interrupt => {
                info!("interrupted while answering");
                writeln!(out, "{INTERRUPTED}")?;
                return Ok(ExitReason::Interrupted);
            }
        };

        match outcome {
            Ok(answer) => {
                info!(answer_len = answer.len(), "answered question");
                writeln!(out, "RESPOSTA: {answer}")?;
                writeln!(out, "{}\n", "-".repeat(50))?;
            }
            Err(e) => {
                error!(error = %e, "failed to answer question");
                writeln!(out, "\nErro ao processar a pergunta: {e}")?;
                writeln!(out, "Tente novamente com uma pergunta diferente.\n")?;
            }
        }
    }
}
