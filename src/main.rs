use colored::*;
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Context, DefaultEditor, Editor, Event, EventContext,
    EventHandler, KeyCode, KeyEvent, Modifiers, Movement, RepeatCount,
};
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

mod command;
mod error;
mod eval;
mod format;
mod notes;
mod price;
mod session;

use command::SideEffect;
use error::CalcError;
use price::{CoinGecko, PriceFeed};
use session::Session;

fn main() -> rustyline::Result<()> {
    let palette = Palette {
        result: (0xB4, 0xB4, 0xB4),  // Light gray
        error: (0xDC, 0x64, 0x5A),   // Soft red
        message: (0x78, 0xB4, 0x78), // Soft green
        note: (0x8C, 0x64, 0x8C),    // Muted purple
    };

    let session = Arc::new(Mutex::new(Session::new()));
    let config = Config::builder().build();
    let mut rl: Editor<CalcHelper, DefaultHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(CalcHelper {
        session: Arc::clone(&session),
    }));
    bind_keypad(&mut rl, &session);

    let history = notes::history_path();
    let _ = rl.load_history(&history);

    let feed = CoinGecko;

    loop {
        // The display shows the previous result until it is edited over
        let initial = session.lock().unwrap().current().to_owned();
        let readline = rl.readline_with_initial("> ", (initial.as_str(), ""));
        match readline {
            Ok(line) => {
                if !line.is_empty() {
                    rl.add_history_entry(line.clone())?;
                }
                if let Some(meta) = line.strip_prefix(':') {
                    run_meta(meta, &palette);
                    session.lock().unwrap().clear();
                    continue;
                }

                debug_println(&format!("Processing input: '{}'", line));
                let effect = {
                    let mut session = session.lock().unwrap();
                    session.set_line(&line);
                    session.submit(&feed)
                };
                let display = session.lock().unwrap().current().to_owned();
                render(&display, &palette);
                if effect == Some(SideEffect::OpenNotes) {
                    edit_notes(&palette)?;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("{:?}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history);
    Ok(())
}

struct Palette {
    result: (u8, u8, u8),
    error: (u8, u8, u8),
    message: (u8, u8, u8),
    note: (u8, u8, u8),
}

static DEBUG: AtomicBool = AtomicBool::new(false);

pub fn debug_println(msg: &str) {
    if DEBUG.load(Ordering::Relaxed) {
        println!("{}", msg);
    }
}

fn render(display: &str, palette: &Palette) {
    if display.is_empty() {
        return;
    }
    let tint = if display == "Error" || display == "API Error" {
        palette.error
    } else {
        palette.result
    };
    println!("{}", display.truecolor(tint.0, tint.1, tint.2));
}

// Live preview: the helper re-evaluates the line on every edit and shows
// the result as a dimmed hint after the cursor.
struct CalcHelper {
    session: Arc<Mutex<Session>>,
}

impl Hinter for CalcHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let mut session = self.session.lock().unwrap();
        session.set_line(line);
        if pos < line.len() {
            return None;
        }
        let preview = session.preview();
        if preview.is_empty() {
            None
        } else {
            Some(format!(" = {}", preview))
        }
    }
}

impl Highlighter for CalcHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dimmed().to_string())
    }
}

impl Completer for CalcHelper {
    type Candidate = String;
}

impl Validator for CalcHelper {}

impl rustyline::Helper for CalcHelper {}

#[derive(Clone, Copy)]
enum Keypad {
    Digit(char),
    Operator(char),
    Bracket,
    Delete,
    Clear,
}

// Routes bound keys through the session so the line editor behaves like
// the keypad: digits replace a finished result, backspace on an empty
// line restores the last entry, brackets pick their own direction.
struct KeypadHandler {
    session: Arc<Mutex<Session>>,
    key: Keypad,
}

impl ConditionalEventHandler for KeypadHandler {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext,
    ) -> Option<Cmd> {
        let mut session = self.session.lock().unwrap();
        session.set_line(ctx.line());
        let was_empty = ctx.line().is_empty();
        match self.key {
            Keypad::Digit(digit) => {
                let replace = session.just_evaluated() && !was_empty;
                session.press_digit(digit);
                if replace {
                    Some(Cmd::Replace(
                        Movement::WholeLine,
                        Some(session.current().to_owned()),
                    ))
                } else {
                    Some(Cmd::SelfInsert(1, digit))
                }
            }
            Keypad::Operator(op) => {
                session.press_operator(op);
                Some(Cmd::SelfInsert(1, op))
            }
            Keypad::Bracket => {
                let bracket = session::next_bracket(ctx.line());
                session.press_bracket();
                match bracket {
                    Some(b) => Some(Cmd::SelfInsert(1, b)),
                    None => Some(Cmd::Noop),
                }
            }
            Keypad::Delete => {
                session.delete();
                if !was_empty {
                    Some(Cmd::Kill(Movement::BackwardChar(1)))
                } else if session.current().is_empty() {
                    Some(Cmd::Noop)
                } else {
                    Some(Cmd::Insert(1, session.current().to_owned()))
                }
            }
            Keypad::Clear => {
                session.clear();
                if was_empty {
                    Some(Cmd::Noop)
                } else {
                    Some(Cmd::Kill(Movement::WholeLine))
                }
            }
        }
    }
}

fn bind_keypad(rl: &mut Editor<CalcHelper, DefaultHistory>, session: &Arc<Mutex<Session>>) {
    let keypad = |key: Keypad| {
        EventHandler::Conditional(Box::new(KeypadHandler {
            session: Arc::clone(session),
            key,
        }))
    };
    for c in "0123456789.".chars() {
        rl.bind_sequence(KeyEvent::from(c), keypad(Keypad::Digit(c)));
    }
    // Keyboard keys type the keypad's display glyphs
    for (key, glyph) in [('+', '+'), ('-', '-'), ('%', '%'), ('*', '×'), ('/', '÷')] {
        rl.bind_sequence(KeyEvent::from(key), keypad(Keypad::Operator(glyph)));
    }
    for c in "()".chars() {
        rl.bind_sequence(KeyEvent::from(c), keypad(Keypad::Bracket));
    }
    rl.bind_sequence(
        KeyEvent(KeyCode::Backspace, Modifiers::NONE),
        keypad(Keypad::Delete),
    );
    rl.bind_sequence(KeyEvent::ctrl('u'), keypad(Keypad::Clear));
}

fn run_meta(input: &str, palette: &Palette) {
    let m = palette.message;
    match input.trim().to_ascii_lowercase().as_str() {
        "debug" => {
            let new_state = !DEBUG.load(Ordering::Relaxed);
            DEBUG.store(new_state, Ordering::Relaxed);
            let msg = format!("Debug {}", if new_state { "enabled" } else { "disabled" });
            println!("{}", msg.truecolor(m.0, m.1, m.2));
        }
        "test" => {
            let (passed, total) = run_tests(palette);
            let msg = format!("{}/{} tests passed.", passed, total);
            println!("{}", msg.truecolor(m.0, m.1, m.2));
        }
        "help" => {
            for line in [
                "keys: 0-9 and . type digits, + - * / % type operators",
                "      ( and ) insert whichever bracket balances",
                "      backspace deletes, and restores the last entry when empty",
                "      ctrl-u clears, enter evaluates",
                "meta: :debug  :test  :help",
            ] {
                println!("{}", line.truecolor(m.0, m.1, m.2));
            }
        }
        _ => {
            let e = palette.error;
            println!("{}", "Unknown command!".truecolor(e.0, e.1, e.2));
        }
    }
}

fn edit_notes(palette: &Palette) -> rustyline::Result<()> {
    let m = palette.message;
    let path = notes::note_path();
    let existing = notes::load(&path);
    if existing.is_empty() {
        println!("{}", "No note yet.".truecolor(m.0, m.1, m.2));
    } else {
        let n = palette.note;
        let trailing_newline = existing.ends_with('\n');
        print!("{}", existing.truecolor(n.0, n.1, n.2));
        if !trailing_newline {
            println!();
        }
    }
    println!(
        "{}",
        "Rewrite the note, end with '.' on its own line. Ctrl-C keeps it unchanged."
            .truecolor(m.0, m.1, m.2)
    );

    // A plain editor, so the keypad bindings stay out of the note
    let mut note_rl = DefaultEditor::new()?;
    let mut lines: Vec<String> = Vec::new();
    loop {
        match note_rl.readline("| ") {
            Ok(line) => {
                if line == "." {
                    let mut content = lines.join("\n");
                    if !content.is_empty() {
                        content.push('\n');
                    }
                    match notes::save(&path, &content) {
                        Ok(()) => {
                            let msg = format!("Note saved to {}.", path.display());
                            println!("{}", msg.truecolor(m.0, m.1, m.2));
                        }
                        Err(err) => {
                            let e = palette.error;
                            let msg = format!("Could not save note: {}", err);
                            println!("{}", msg.truecolor(e.0, e.1, e.2));
                        }
                    }
                    break;
                }
                lines.push(line);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("{}", "Note unchanged.".truecolor(m.0, m.1, m.2));
                break;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

fn run_tests(palette: &Palette) -> (usize, usize) {
    struct FixedFeed;
    impl PriceFeed for FixedFeed {
        fn usd_price(&self, _coin: &str) -> Result<serde_json::Number, CalcError> {
            Ok(serde_json::Number::from(65000))
        }
    }
    struct DownFeed;
    impl PriceFeed for DownFeed {
        fn usd_price(&self, _coin: &str) -> Result<serde_json::Number, CalcError> {
            Err(CalcError::Network("offline".to_owned()))
        }
    }

    let digest = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    let tests: Vec<(&str, &str, &dyn PriceFeed)> = vec![
        ("2+3", "5", &FixedFeed),
        ("5÷2", "2", &FixedFeed),
        ("4×3", "12", &FixedFeed),
        ("5%", "0.05", &FixedFeed),
        ("(1+2)×(3+4)", "21", &FixedFeed),
        ("1000000+234567", "1,234,567", &FixedFeed),
        ("4÷0", "", &FixedFeed),
        ("5+", "", &FixedFeed),
        ("HASH hello", digest, &FixedFeed),
        ("hash hello", digest, &FixedFeed),
        ("ROI 100 10 2", "120.0", &FixedFeed),
        ("ROI 100 abc 2", "Error", &FixedFeed),
        ("btc", "65,000", &FixedFeed),
        ("NOTE", "NOTE", &FixedFeed),
        ("BTC", "API Error", &DownFeed),
    ];

    let mut passed = 0;
    let total = tests.len();

    for (input, expected, feed) in tests {
        println!("> {}", input);
        let mut session = Session::new();
        session.set_line(input);
        session.submit(feed);
        let got = session.current().to_owned();
        render(&got, palette);

        if got == expected {
            println!("{}", "Pass!".green());
            passed += 1;
        } else {
            println!("{}", "fail!".red());
            println!("Want: '{}'", expected);
            println!("Got : '{}'", got);
        }
        println!();
    }

    (passed, total)
}
