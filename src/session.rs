use crate::command::{self, SideEffect};
use crate::debug_println;
use crate::eval;
use crate::format;
use crate::price::PriceFeed;

// Which bracket the keypad's bracket control should insert. Gross counts
// only, nesting is not validated. None means the control inserts nothing
// (trailing '.' and other oddballs).
pub fn next_bracket(expr: &str) -> Option<char> {
    let open_count = expr.matches('(').count();
    let close_count = expr.matches(')').count();
    match expr.chars().last() {
        None => Some('('),
        Some(c) if "+-*%÷×(".contains(c) => Some('('),
        Some(c) if c.is_ascii_digit() || c == ')' => {
            if open_count > close_count {
                Some(')')
            } else {
                Some('(')
            }
        }
        Some(_) => None,
    }
}

// The one live editing session: the expression being typed, the previous
// submission, the preview computed on the last edit, and whether the
// display is currently showing a finished result.
pub struct Session {
    current: String,
    last: String,
    preview: String,
    just_evaluated: bool,
}

impl Session {
    pub fn new() -> Session {
        Session {
            current: String::new(),
            last: String::new(),
            preview: String::new(),
            just_evaluated: false,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn just_evaluated(&self) -> bool {
        self.just_evaluated
    }

    // Sync from an external line editor. Any change counts as an edit.
    pub fn set_line(&mut self, line: &str) {
        if line != self.current {
            self.current.clear();
            self.current.push_str(line);
            self.just_evaluated = false;
            self.refresh_preview();
        }
    }

    pub fn press_digit(&mut self, digit: char) {
        if self.just_evaluated {
            // Typing a fresh number over a finished result
            self.current.clear();
        }
        self.current.push(digit);
        self.just_evaluated = false;
        self.refresh_preview();
    }

    pub fn press_operator(&mut self, op: char) {
        self.current.push(op);
        self.just_evaluated = false;
        self.refresh_preview();
    }

    pub fn press_bracket(&mut self) {
        if let Some(bracket) = next_bracket(&self.current) {
            self.current.push(bracket);
        }
        self.just_evaluated = false;
        self.refresh_preview();
    }

    pub fn clear(&mut self) {
        // just_evaluated is deliberately left alone here
        self.current.clear();
        self.refresh_preview();
    }

    pub fn delete(&mut self) {
        if self.current.is_empty() {
            // Undo-last-clear convenience: bring back the previous submission
            self.current = self.last.clone();
        } else {
            self.current.pop();
        }
        self.just_evaluated = false;
        self.refresh_preview();
    }

    pub fn submit(&mut self, feed: &dyn PriceFeed) -> Option<SideEffect> {
        let raw = self.current.clone();
        self.last = raw.clone();
        debug_println(&format!("Submitting: {:?}", raw));
        let (display, effect) = command::dispatch(&raw, &self.preview, feed);
        self.current = display;
        self.just_evaluated = true;
        self.preview.clear();
        effect
    }

    fn refresh_preview(&mut self) {
        self.preview = match eval::evaluate(&eval::normalize(&self.current)) {
            Ok(value) => format::value(&value),
            Err(_) => String::new(),
        };
    }
}
