use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dialoguer::Input;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use interview_coach::db::{self, NewSession, SessionRepo};
use interview_coach::interview::{
    Command as InterviewCommand, FeedbackSummary, GenerationRequest, InterviewEvent,
};
use interview_coach::voice::{
    ConsoleFeed, ConsoleRecognizer, ConsoleSink, SpeechCapture, SpeechPlayback, TextToSpeech,
    TtsProvider,
};
use interview_coach::{
    AnswerRecord, Config, FeedbackRecord, FeedbackService, HttpBackend, InterviewOrchestrator,
    InterviewSession, InterviewStore, ModelCaller, QuestionGenerator, SqliteStore,
};

/// Coach - mock technical interviews with spoken questions and AI feedback
#[derive(Parser)]
#[command(name = "coach", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a question set and store it as a new session
    New {
        /// Target role (e.g. "Backend Engineer")
        #[arg(long)]
        role: Option<String>,
        /// Experience level (e.g. "3 years", "senior")
        #[arg(long)]
        experience: Option<String>,
        /// Comma separated topics
        #[arg(long, value_delimiter = ',')]
        topics: Vec<String>,
        /// Number of questions
        #[arg(short = 'n', long)]
        count: Option<usize>,
        /// Free-form job description
        #[arg(long)]
        description: Option<String>,
    },
    /// Run an interview for a stored session
    Run {
        /// Session ID
        session: String,
        /// Type answers instead of speaking them
        #[arg(long, env = "COACH_TEXT_MODE")]
        text: bool,
    },
    /// Show the feedback summary of a session
    Report {
        /// Session ID
        session: String,
    },
    /// Explain the concept behind a question
    Explain {
        /// Question text
        question: String,
    },
    /// List stored sessions
    Sessions,
    /// Interactive first-run setup
    Setup,
    /// Test microphone input
    #[cfg(feature = "audio")]
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    #[cfg(feature = "audio")]
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
        /// Write the MP3 here instead of playing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,interview_coach=info",
        1 => "info,interview_coach=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            if let Some(err) = e.downcast_ref::<interview_coach::Error>() {
                eprintln!("{}", err.kind().user_message());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::New {
            role,
            experience,
            topics,
            count,
            description,
        } => cmd_new(role, experience, topics, count, description).await,
        Command::Run { session, text } => cmd_run(&session, text).await,
        Command::Report { session } => cmd_report(&session),
        Command::Explain { question } => cmd_explain(&question).await,
        Command::Sessions => cmd_sessions(),
        Command::Setup => interview_coach::setup::run_setup(),
        #[cfg(feature = "audio")]
        Command::TestMic { duration } => test_mic(duration).await,
        #[cfg(feature = "audio")]
        Command::TestSpeaker => test_speaker(),
        Command::TestTts { text, output } => test_tts(&text, output.as_deref()).await,
    }
}

fn model_caller(config: &Config) -> anyhow::Result<ModelCaller> {
    let backend = HttpBackend::new(
        config.llm.provider,
        config.llm_api_key().cloned(),
        config.llm.base_url.clone(),
    )?;
    Ok(ModelCaller::new(Arc::new(backend), config.llm.models.clone())?)
}

fn session_repo(config: &Config) -> anyhow::Result<SessionRepo> {
    let pool = db::init(&config.database_path())?;
    Ok(SessionRepo::new(pool))
}

fn prompt_missing(value: Option<String>, prompt: &str) -> anyhow::Result<String> {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => Ok(v),
        None => Ok(Input::new().with_prompt(prompt).interact_text()?),
    }
}

async fn cmd_new(
    role: Option<String>,
    experience: Option<String>,
    mut topics: Vec<String>,
    count: Option<usize>,
    description: Option<String>,
) -> anyhow::Result<()> {
    let config = Config::load()?;

    let role = prompt_missing(role, "Role")?;
    let experience_level = prompt_missing(experience, "Experience level")?;
    topics.retain(|t| !t.trim().is_empty());
    if topics.is_empty() {
        let line: String = Input::new()
            .with_prompt("Topics (comma separated)")
            .interact_text()?;
        topics = line
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }
    let count = match count {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Number of questions")
            .default(5)
            .interact_text()?,
    };

    let generator =
        QuestionGenerator::new(model_caller(&config)?).with_max_questions(config.interview.max_questions);

    println!("Generating {count} questions...");
    let questions = generator
        .generate(&GenerationRequest {
            role: role.clone(),
            experience_level: experience_level.clone(),
            topics: topics.clone(),
            count,
        })
        .await?;

    let repo = session_repo(&config)?;
    let details = repo.create(&NewSession {
        role,
        experience_level,
        topics,
        description: description.filter(|d| !d.trim().is_empty()),
        questions,
    })?;

    println!("\nSession {} ({}, {})", details.id, details.role, details.experience_level);
    for (i, question) in details.questions.iter().enumerate() {
        println!("  {}. {}", i + 1, question.text);
    }
    println!("\nStart it with: coach run {}", details.id);

    Ok(())
}

async fn cmd_run(session_id: &str, text_mode: bool) -> anyhow::Result<()> {
    let config = Config::load_with_options(text_mode)?;

    let store = Arc::new(SqliteStore::new(db::init(&config.database_path())?));
    let details = store.get_session(session_id).await?;
    let session = InterviewSession::from_details(details, config.interview.candidate_name.clone())?;
    let feedback = FeedbackService::new(model_caller(&config)?);

    let io = interview_io(&config)?;
    let voice = io.feed.is_none();

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (commands_tx, commands_rx) = mpsc::channel(16);

    let mut orchestrator =
        InterviewOrchestrator::new(session, io.capture, io.playback, feedback, store)
            .with_events(events_tx)
            .with_feedback_pause(config.interview.feedback_pause);

    let printer = tokio::spawn(print_events(events_rx, voice));
    spawn_input(commands_tx.clone(), io.feed);
    spawn_interrupt(commands_tx.clone());

    if voice {
        println!("Answer out loud. Press Enter when done, or type /end to finish early.\n");
    } else {
        println!("Type your answer, then an empty line (or /next) to submit. /end finishes early.\n");
    }

    commands_tx.send(InterviewCommand::Start).await?;
    let transcript = orchestrator.run(commands_rx).await?;

    drop(orchestrator);
    printer.await?;

    print_summary(&FeedbackSummary::from_answers(&transcript.feedbacks));
    println!("\nReview later with: coach report {session_id}");

    Ok(())
}

struct InterviewIo {
    capture: SpeechCapture,
    playback: SpeechPlayback,
    /// Present in text mode
    feed: Option<ConsoleFeed>,
}

fn console_io() -> InterviewIo {
    let recognizer = ConsoleRecognizer::new();
    let feed = recognizer.feed();
    InterviewIo {
        capture: SpeechCapture::new(Box::new(recognizer)),
        playback: SpeechPlayback::new(Arc::new(ConsoleSink)),
        feed: Some(feed),
    }
}

#[cfg(feature = "audio")]
fn interview_io(config: &Config) -> anyhow::Result<InterviewIo> {
    use interview_coach::voice::{
        AudioPlayback, MicrophoneRecognizer, SpeechToText, SttProvider, VoiceSink,
    };

    if !config.voice.enabled {
        return Ok(console_io());
    }

    let stt_key = match config.voice.stt_provider {
        SttProvider::Whisper => config.api_keys.openai.clone(),
        SttProvider::Deepgram => config.api_keys.deepgram.clone(),
    };
    let stt = SpeechToText::new(config.voice.stt_provider, stt_key, config.voice.stt_model.clone())?;
    let sink = VoiceSink::new(text_to_speech(config)?, AudioPlayback::new()?);

    Ok(InterviewIo {
        capture: SpeechCapture::new(Box::new(MicrophoneRecognizer::new(stt))),
        playback: SpeechPlayback::new(Arc::new(sink)),
        feed: None,
    })
}

#[cfg(not(feature = "audio"))]
#[allow(clippy::unnecessary_wraps)]
fn interview_io(config: &Config) -> anyhow::Result<InterviewIo> {
    if config.voice.enabled {
        tracing::warn!("built without audio support, falling back to text mode");
    }
    Ok(console_io())
}

fn text_to_speech(config: &Config) -> anyhow::Result<TextToSpeech> {
    let key = match config.voice.tts_provider {
        TtsProvider::OpenAi => config.api_keys.openai.clone(),
        TtsProvider::ElevenLabs => config.api_keys.elevenlabs.clone(),
    };
    Ok(TextToSpeech::new(
        config.voice.tts_provider,
        key,
        config.voice.tts_voice.clone(),
        config.voice.tts_speed,
        config.voice.tts_model.clone(),
    )?)
}

/// Route stdin lines to the orchestrator
///
/// stdin reads block, so this runs on a plain thread that is abandoned at exit.
fn spawn_input(commands: mpsc::Sender<InterviewCommand>, feed: Option<ConsoleFeed>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim() {
                "/end" => Some(InterviewCommand::End),
                "" | "/next" => Some(InterviewCommand::Advance),
                text => {
                    match &feed {
                        Some(feed) if !feed.submit(text) => {
                            println!("(not listening right now, input ignored)");
                        }
                        Some(_) => {}
                        None => println!("(voice mode: speak your answer, Enter submits)"),
                    }
                    None
                }
            };

            if let Some(command) = command
                && commands.blocking_send(command).is_err()
            {
                break;
            }
        }
    });
}

/// First Ctrl-C ends the interview gracefully, the second exits
fn spawn_interrupt(commands: mpsc::Sender<InterviewCommand>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        println!("\nEnding interview...");
        let _ = commands.send(InterviewCommand::End).await;

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

async fn print_events(mut events: mpsc::UnboundedReceiver<InterviewEvent>, voice: bool) {
    while let Some(event) = events.recv().await {
        match event {
            InterviewEvent::PhaseChanged(phase) => tracing::debug!(%phase, "phase changed"),
            InterviewEvent::Spoke(line) if voice => println!("Interviewer: {line}"),
            InterviewEvent::Transcript(text) if voice => println!("  You: {text}"),
            InterviewEvent::Spoke(_) | InterviewEvent::Transcript(_) => {}
            InterviewEvent::AnswerRejected { .. } => {
                println!("(no answer yet; answer the question or type /end to finish)");
            }
            InterviewEvent::FeedbackReady { index, feedback } => {
                print_feedback(index, &feedback);
            }
            InterviewEvent::FeedbackUnavailable { index } => {
                println!("\n[Question {}] feedback unavailable\n", index + 1);
            }
            InterviewEvent::PersistenceFailed { operation, error } => {
                eprintln!("warning: {operation} failed, results may not be saved: {error}");
            }
            InterviewEvent::Completed(transcript) => {
                println!(
                    "\nInterview complete: {} answer(s) recorded.",
                    transcript.total_answers
                );
            }
        }
    }
}

fn print_feedback(index: usize, feedback: &FeedbackRecord) {
    println!("\n[Question {}] score {:.1}/10", index + 1, feedback.score);
    println!("  Strengths:    {}", feedback.strengths);
    println!("  Improvements: {}", feedback.improvements);
    println!("  Ideal answer: {}", feedback.ideal_answer_hint);
    if feedback.fallback {
        println!("  (the model's response could not be read; showing a placeholder)");
    }
    println!();
}

fn print_summary(summary: &FeedbackSummary) {
    println!("\n=== Summary ===");
    if summary.total == 0 {
        println!("No evaluated answers.");
    } else {
        println!(
            "Average score: {:.1}/10 ({})",
            summary.average_score, summary.level
        );
        println!(
            "Strong answers: {}  Needs improvement: {}",
            summary.strong_answers, summary.needs_improvement
        );
    }
    if summary.unevaluated > 0 {
        println!("Answers without feedback: {}", summary.unevaluated);
    }
    if !summary.top_strengths.is_empty() {
        println!("\nStrengths:");
        for s in &summary.top_strengths {
            println!("  - {s}");
        }
    }
    if !summary.top_improvements.is_empty() {
        println!("\nTo improve:");
        for s in &summary.top_improvements {
            println!("  - {s}");
        }
    }
}

fn print_answer(answer: &AnswerRecord) {
    println!("\n{}. {}", answer.question_index + 1, answer.question_text);
    println!("   Your answer: {}", answer.answer_text);
    match &answer.feedback {
        Some(feedback) => {
            println!("   Score: {:.1}/10", feedback.score);
            println!("   Strengths: {}", feedback.strengths);
            println!("   Improvements: {}", feedback.improvements);
        }
        None => println!("   (no feedback)"),
    }
}

fn cmd_report(session_id: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let repo = session_repo(&config)?;

    let details = repo.get(session_id)?;
    let answers = repo.answers(session_id)?;

    println!(
        "Session {} ({}, {}) - {}",
        details.id, details.role, details.experience_level, details.status
    );
    if answers.is_empty() {
        println!("\nNo answers recorded yet.");
        return Ok(());
    }

    for answer in &answers {
        print_answer(answer);
    }
    print_summary(&FeedbackSummary::from_answers(&answers));

    Ok(())
}

async fn cmd_explain(question: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let generator = QuestionGenerator::new(model_caller(&config)?);

    let explanation = generator.explain(question).await?;
    println!("{}\n\n{}", explanation.title, explanation.explanation);

    Ok(())
}

fn cmd_sessions() -> anyhow::Result<()> {
    let config = Config::load()?;
    let sessions = session_repo(&config)?.list()?;

    if sessions.is_empty() {
        println!("No sessions yet. Create one with `coach new`.");
        return Ok(());
    }

    for s in sessions {
        println!(
            "{}  {:<11}  {}/{} answered  {} ({})  {}",
            s.id,
            s.status.as_str(),
            s.total_answers,
            s.question_count,
            s.role,
            s.experience_level,
            s.created_at.format("%Y-%m-%d %H:%M"),
        );
    }

    Ok(())
}

/// Test microphone input
#[cfg(feature = "audio")]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    use std::time::Duration;

    use interview_coach::voice::{AudioCapture, SAMPLE_RATE};

    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    println!("Sample rate: {SAMPLE_RATE} Hz");
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Calculate RMS energy
#[cfg(feature = "audio")]
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test speaker output with a sine wave
#[cfg(feature = "audio")]
fn test_speaker() -> anyhow::Result<()> {
    use interview_coach::voice::{AudioPlayback, CancelFlag};

    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    // 2 seconds of 440Hz at 24kHz
    let sample_rate = 24_000.0_f32;
    let frequency = 440.0_f32;
    let num_samples = 48_000_usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    playback.play_blocking(samples, &CancelFlag::new())?;

    println!("---");
    println!("If you heard the tone, your speakers are working!");
    println!("If not, check: pactl info | grep 'Default Sink'");

    Ok(())
}

/// Test TTS output
async fn test_tts(text: &str, output: Option<&Path>) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let config = Config::load()?;
    let tts = text_to_speech(&config)?;

    println!("Synthesizing speech...");
    let mp3 = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", mp3.len());

    if let Some(path) = output {
        std::fs::write(&path, &mp3)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    #[cfg(feature = "audio")]
    {
        use interview_coach::voice::{AudioPlayback, CancelFlag};

        println!("Playing audio...");
        let playback = AudioPlayback::new()?;
        tokio::task::spawn_blocking(move || playback.play_mp3_blocking(&mp3, &CancelFlag::new()))
            .await??;
        println!("\nIf you heard the speech, TTS is working!");
        Ok(())
    }

    #[cfg(not(feature = "audio"))]
    {
        anyhow::bail!("built without audio support; pass --output to save the MP3 instead")
    }
}
