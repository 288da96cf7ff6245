//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::io::{BufRead, Write};
use std::path::Path;

use log::{info, warn};

use crate::config::{Difficulty, GameConfig};
use crate::engine::{
    AudioSink, FaderControl, GainBus, MixdownSink, StemSet, Transport, VirtualFader,
};
use crate::error::{Result, StemmixError};
use crate::game::{FaderCurve, Mode, Session, Track};

/// Build the game config from a file and command-line overrides
pub fn load_config(
    path: Option<&Path>,
    seed: Option<u64>,
    difficulty: Option<Difficulty>,
) -> Result<GameConfig> {
    let mut config = match path {
        Some(path) => {
            info!("Loading config: {}", path.display());
            GameConfig::from_json_file(path)?
        }
        None => GameConfig::default(),
    };
    if let Some(difficulty) = difficulty {
        config.targets = difficulty.target_config();
    }
    if seed.is_some() {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

/// Print the fader curve as a table.
pub fn print_curve(config: &GameConfig, steps: usize, out: &mut impl Write) -> Result<()> {
    let curve = FaderCurve::new(config.curve)?;
    let steps = steps.max(1);

    writeln!(out, "{:>8} {:>10} {:>8}", "position", "dB", "gain")?;
    writeln!(out, "{:-<28}", "")?;
    for i in 0..=steps {
        let position = i as f64 / steps as f64;
        let gain = curve.to_gain(position);
        writeln!(out, "{:>8.3} {:>10} {:>8.3}", position, curve.format_db(gain), gain)?;
    }
    Ok(())
}

/// Play one round non-interactively and print the score.
pub fn score_round(
    config: GameConfig,
    gains: &[(Track, f64)],
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let mut session = Session::with_virtual_faders(config, GainBus::ready())?;
    apply_gains(&mut session, gains)?;

    let score = session
        .on_submit()
        .ok_or(StemmixError::NotReady { action: "submit" })?;
    let reveal = session.reveal().unwrap_or_default();

    if json {
        let report = serde_json::json!({
            "round": session.round().id(),
            "started_at": session.round().started_at(),
            "score": score,
            "tracks": reveal,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(out, "Score: {}", score)?;
    writeln!(out, "{:-<44}", "")?;
    writeln!(out, "{:<8} {:>10} {:>10} {:>12}", "track", "yours", "answer", "off (oct)")?;
    for row in reveal {
        writeln!(
            out,
            "{:<8} {:>10} {:>10} {:>12.2}",
            row.track.name(),
            session.curve().format_db(row.player_gain),
            session.curve().format_db(row.answer_gain),
            row.error_octaves
        )?;
    }
    Ok(())
}

/// Render the round's audible mix of a stem directory to WAV.
pub fn mixdown(
    config: GameConfig,
    stems: &Path,
    output: &Path,
    gains: &[(Track, f64)],
    answer: bool,
    bit_depth: u16,
) -> Result<()> {
    info!("Mixing stems from: {}", stems.display());

    let mut sink = MixdownSink::new();
    sink.load_stems(stems, &config.tracks)?;

    let mut session = Session::with_virtual_faders(config, sink)?;
    apply_gains(&mut session, gains)?;
    if answer {
        session.on_toggle_comparison(true);
    }

    let mode = session.mode();
    let sink = session.into_sink();
    sink.write_wav(output, bit_depth)?;

    println!("Mix written: {} ({} mode)", output.display(), mode);
    Ok(())
}

fn apply_gains<S: AudioSink, F: FaderControl>(
    session: &mut Session<S, F>,
    gains: &[(Track, f64)],
) -> Result<()> {
    for &(track, gain) in gains {
        if !session.on_fader_changed(track, gain) {
            return Err(StemmixError::UnknownTrack {
                name: track.to_string(),
            });
        }
    }
    Ok(())
}

// ============================================================================
// Interactive play
// ============================================================================

/// One line typed during `play`
#[derive(Debug, Clone, PartialEq)]
pub enum PlayCommand {
    Set(Track, f64),
    Compare(bool),
    Submit,
    Restart,
    Master(f64),
    Play,
    Pause,
    Toggle,
    /// Seek to a percentage of the song
    Seek(f64),
    Time,
    Show,
    Help,
    Quit,
}

/// Parse one `play` input line
pub fn parse_play_command(line: &str) -> Result<PlayCommand> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let bad = |reason: String| StemmixError::InvalidInput {
        input: line.trim().to_string(),
        reason,
    };
    let number = |word: &str| -> Result<f64> {
        word.parse::<f64>()
            .map_err(|_| bad(format!("'{}' is not a number", word)))
    };

    match words.as_slice() {
        ["set", track, gain] => Ok(PlayCommand::Set(track.parse()?, number(*gain)?)),
        ["compare", "on"] => Ok(PlayCommand::Compare(true)),
        ["compare", "off"] => Ok(PlayCommand::Compare(false)),
        ["submit"] => Ok(PlayCommand::Submit),
        ["restart"] => Ok(PlayCommand::Restart),
        ["master", gain] => Ok(PlayCommand::Master(number(*gain)?)),
        ["play"] => Ok(PlayCommand::Play),
        ["pause"] => Ok(PlayCommand::Pause),
        ["toggle"] => Ok(PlayCommand::Toggle),
        ["seek", percent] => Ok(PlayCommand::Seek(number(*percent)?)),
        ["time"] => Ok(PlayCommand::Time),
        ["show"] => Ok(PlayCommand::Show),
        ["help"] | ["?"] => Ok(PlayCommand::Help),
        ["quit"] | ["exit"] => Ok(PlayCommand::Quit),
        [] => Err(bad("empty command".to_string())),
        _ => Err(bad("unknown command, type 'help' for the list".to_string())),
    }
}

const PLAY_HELP: &str = "\
Commands:
  set <track> <gain>   move a fader (linear gain, 1.0 = unchanged)
  compare on|off       listen to the original mix / your mix
  submit               score this round and reveal the answer
  restart              start a new round
  master <gain>        set the master volume
  play | pause         start or stop the song loop
  toggle               play if paused, pause if playing
  seek <percent>       jump to a point in the song
  time                 print the playhead
  show                 print the faders
  quit                 leave";

/// Interactive round loop over any line source
///
/// `stems` is the directory the song is played from; its length drives the
/// transport. If it fails to load the audio is not ready, so submit and
/// comparison stay inert. Without stems the round is played on gains alone.
/// `clock` reads the playback clock in seconds.
pub fn play(
    config: GameConfig,
    stems: Option<&Path>,
    mut clock: impl FnMut() -> f64,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "Stemmix v{}", env!("CARGO_PKG_VERSION"))?;

    let (bus, duration) = match stems {
        None => (GainBus::ready(), 0.0),
        Some(dir) => match StemSet::load_dir(dir, &config.tracks) {
            Ok(set) => (GainBus::ready(), set.duration_secs()),
            Err(e) => {
                warn!("stem loading failed: {}", e);
                writeln!(out, "Audio not loaded: {}", e)?;
                (GainBus::new(), 0.0)
            }
        },
    };
    let mut transport = Transport::new(duration);
    let mut session = Session::with_virtual_faders(config, bus)?;

    writeln!(out, "{}", PLAY_HELP)?;
    show(&session, out)?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_play_command(&line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "{}", e)?;
                continue;
            }
        };

        session.sink_mut().set_time(clock());
        let now = session.sink().current_time();

        match command {
            PlayCommand::Set(track, gain) => {
                let position = session.curve().to_position(gain);
                let Some(fader) = session.fader_mut(track) else {
                    writeln!(out, "{} is not in this round", track)?;
                    continue;
                };
                match fader.drag_to(position) {
                    Some(dragged) if session.on_fader_changed(track, dragged) => {
                        let label = session.fader(track).map(VirtualFader::label);
                        writeln!(out, "{} -> {}", track, label.unwrap_or_default())?;
                    }
                    _ => writeln!(out, "{} is locked", track)?,
                }
            }
            PlayCommand::Compare(on) => {
                if session.on_toggle_comparison(on) {
                    writeln!(out, "Mode: {}", session.mode())?;
                } else {
                    writeln!(out, "Not ready yet")?;
                }
            }
            PlayCommand::Submit => match session.on_submit() {
                Some(score) => {
                    writeln!(out, "Score: {}", score)?;
                    show(&session, out)?;
                }
                None => writeln!(out, "Not ready yet")?,
            },
            PlayCommand::Restart => {
                session.on_restart()?;
                writeln!(out, "New round")?;
                show(&session, out)?;
            }
            PlayCommand::Master(gain) => {
                session.on_master_volume(gain);
                let master = session.sink().master_gain();
                writeln!(out, "Master: {}", session.curve().format_db(master))?;
            }
            PlayCommand::Play
            | PlayCommand::Pause
            | PlayCommand::Toggle
            | PlayCommand::Seek(_)
            | PlayCommand::Time
                if transport.duration_secs() <= 0.0 =>
            {
                writeln!(out, "No audio loaded")?;
            }
            PlayCommand::Play => {
                transport.play(now);
                writeln!(out, "{}", playhead(&transport, now))?;
            }
            PlayCommand::Pause => {
                transport.pause(now);
                writeln!(out, "{}", playhead(&transport, now))?;
            }
            PlayCommand::Toggle => {
                transport.toggle(now);
                writeln!(out, "{}", playhead(&transport, now))?;
            }
            PlayCommand::Seek(percent) => {
                transport.seek_percent(percent, now);
                writeln!(out, "{}", playhead(&transport, now))?;
            }
            PlayCommand::Time => writeln!(out, "{}", playhead(&transport, now))?,
            PlayCommand::Show => show(&session, out)?,
            PlayCommand::Help => writeln!(out, "{}", PLAY_HELP)?,
            PlayCommand::Quit => break,
        }
    }
    Ok(())
}

fn playhead(transport: &Transport, now: f64) -> String {
    format!(
        "{} {:.1}s / {:.1}s ({:.0}%)",
        transport.state(),
        transport.position(now),
        transport.duration_secs(),
        transport.progress_percent(now)
    )
}

fn show(session: &Session<GainBus, VirtualFader>, out: &mut impl Write) -> Result<()> {
    let title = match (session.mode(), session.last_score()) {
        (Mode::Comparison, Some(score)) => format!("answer (score {})", score),
        (Mode::PlayerSetting, Some(score)) => format!("your mix (score {})", score),
        (Mode::Comparison, None) => "original mix".to_string(),
        (Mode::PlayerSetting, None) => "your mix".to_string(),
    };
    writeln!(out, "{:-<32}", "")?;
    writeln!(out, "{}", title)?;
    for track in session.round().tracks() {
        if let Some(fader) = session.fader(track) {
            let lock = if fader.is_disabled() { " (locked)" } else { "" };
            writeln!(out, "  {:<8} {:>9}{}", track.name(), fader.label(), lock)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::export_wav;

    fn seeded() -> GameConfig {
        GameConfig {
            seed: Some(11),
            ..GameConfig::default()
        }
    }

    fn run(config: GameConfig, stems: Option<&Path>, script: &str) -> String {
        let mut tick = 0.0;
        let clock = move || {
            tick += 1.0;
            tick
        };
        let mut out = Vec::new();
        play(config, stems, clock, script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_play_command() {
        assert_eq!(
            parse_play_command("set bass 0.5").unwrap(),
            PlayCommand::Set(Track::Bass, 0.5)
        );
        assert_eq!(parse_play_command(" compare on ").unwrap(), PlayCommand::Compare(true));
        assert_eq!(parse_play_command("seek 25").unwrap(), PlayCommand::Seek(25.0));
        assert_eq!(parse_play_command("toggle").unwrap(), PlayCommand::Toggle);
        assert_eq!(parse_play_command("quit").unwrap(), PlayCommand::Quit);
        assert_eq!(parse_play_command("set tuba 1").unwrap_err().error_code(), "UNKNOWN_TRACK");
        assert_eq!(parse_play_command("set bass loud").unwrap_err().error_code(), "INVALID_INPUT");
        assert_eq!(parse_play_command("dance").unwrap_err().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_print_curve() {
        let mut out = Vec::new();
        print_curve(&GameConfig::default(), 2, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("-14.0 dB"));
        assert!(text.contains("+0.0 dB"));
        assert!(text.contains("+14.0 dB"));
    }

    #[test]
    fn test_score_round_json() {
        let mut out = Vec::new();
        score_round(seeded(), &[(Track::Vocal, 2.0)], true, &mut out).unwrap();
        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let score = report["score"].as_u64().unwrap();
        assert!(score <= 100);
        assert_eq!(report["tracks"].as_array().unwrap().len(), 6);
        assert_eq!(report["tracks"][0]["track"], "vocal");
        assert_eq!(report["tracks"][0]["player_gain"], 2.0);
    }

    #[test]
    fn test_load_config_overrides() {
        let config = load_config(None, Some(3), Some(Difficulty::Easy)).unwrap();
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.targets, Difficulty::Easy.target_config());
    }

    #[test]
    fn test_play_session() {
        let script = "set vocal 2\ncompare on\nset vocal 0.5\ncompare off\nsubmit\nrestart\nquit\nsubmit\n";
        let text = run(seeded(), None, script);

        assert!(text.contains("vocal -> +6.0 dB"));
        assert!(text.contains("Mode: comparison"));
        assert!(text.contains("vocal is locked"));
        assert!(text.contains("Score: "));
        assert!(text.contains("New round"));
        // nothing after quit is processed
        assert_eq!(text.matches("Score: ").count(), 1);
    }

    #[test]
    fn test_faders_reopen_after_submit() {
        let text = run(seeded(), None, "submit\nset vocal 2\ncompare off\nset vocal 2\nquit\n");
        assert!(text.contains("answer (score "));
        assert!(text.contains("vocal is locked"));
        assert!(text.contains("Mode: player setting"));
        assert!(text.contains("vocal -> +6.0 dB"));
    }

    #[test]
    fn test_show_reflects_set() {
        let text = run(seeded(), None, "set vocal 2\nshow\nquit\n");
        let last_vocal = text.lines().filter(|l| l.trim_start().starts_with("vocal")).last();
        assert_eq!(last_vocal.map(str::trim), Some("vocal      +6.0 dB"));
    }

    #[test]
    fn test_transport_follows_clock() {
        let dir = tempfile::tempdir().unwrap();
        let config = GameConfig {
            tracks: vec![Track::Vocal, Track::Bass],
            ..seeded()
        };
        // 10 seconds of audio
        for track in &config.tracks {
            let path = dir.path().join(format!("{}.wav", track.name()));
            export_wav(&[vec![0.1; 1000]], 100, &path, 16).unwrap();
        }

        // the clock advances one second per command
        let script = "play\ntime\npause\ntime\nseek 50\ntime\ntoggle\ntime\nquit\n";
        let text = run(config, Some(dir.path()), script);
        assert!(text.contains("Playing 1.0s / 10.0s (10%)"));
        assert!(text.contains("Paused 2.0s / 10.0s (20%)"));
        assert!(text.contains("Paused 5.0s / 10.0s (50%)"));
        assert!(text.contains("Playing 6.0s / 10.0s (60%)"));
    }

    #[test]
    fn test_failed_stem_load_keeps_round_inert() {
        let dir = tempfile::tempdir().unwrap();
        let text = run(seeded(), Some(dir.path()), "compare on\nsubmit\ntime\nset bass 2\nquit\n");
        assert!(text.contains("Audio not loaded"));
        assert_eq!(text.matches("Not ready yet").count(), 2);
        assert!(text.contains("No audio loaded"));
        assert!(!text.contains("Score: "));
        // faders still work while waiting for audio
        assert!(text.contains("bass -> +6.0 dB"));
    }

    #[test]
    fn test_transport_without_stems() {
        let text = run(seeded(), None, "play\nquit\n");
        assert!(text.contains("No audio loaded"));
    }
}
