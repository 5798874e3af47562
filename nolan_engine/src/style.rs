//! Terminal styling for the player.
//!
//! [`PlayStyle`] wraps `colored` so string literals and owned strings can be
//! styled in place.

use colored::{ColoredString, Colorize};

pub trait PlayStyle {
    fn story_style(&self) -> ColoredString;
    fn action_style(&self) -> ColoredString;
    fn choice_style(&self) -> ColoredString;
    fn index_style(&self) -> ColoredString;
    fn scene_style(&self) -> ColoredString;
    fn signal_style(&self) -> ColoredString;
    fn operation_style(&self) -> ColoredString;
    fn error_style(&self) -> ColoredString;
    fn section_style(&self) -> ColoredString;
}

impl PlayStyle for &str {
    fn story_style(&self) -> ColoredString {
        self.italic().truecolor(102, 208, 250)
    }
    fn action_style(&self) -> ColoredString {
        self.truecolor(220, 180, 40)
    }
    fn choice_style(&self) -> ColoredString {
        self.truecolor(13, 130, 60).underline()
    }
    fn index_style(&self) -> ColoredString {
        self.bold().truecolor(230, 80, 80)
    }
    fn scene_style(&self) -> ColoredString {
        self.truecolor(223, 77, 10).underline()
    }
    fn signal_style(&self) -> ColoredString {
        self.dimmed().truecolor(80, 80, 230)
    }
    fn operation_style(&self) -> ColoredString {
        self.dimmed().italic()
    }
    fn error_style(&self) -> ColoredString {
        self.truecolor(230, 30, 30)
    }
    fn section_style(&self) -> ColoredString {
        let bracketed = format!("[{self}]");
        bracketed.truecolor(75, 80, 75)
    }
}

impl PlayStyle for String {
    fn story_style(&self) -> ColoredString {
        self.as_str().story_style()
    }
    fn action_style(&self) -> ColoredString {
        self.as_str().action_style()
    }
    fn choice_style(&self) -> ColoredString {
        self.as_str().choice_style()
    }
    fn index_style(&self) -> ColoredString {
        self.as_str().index_style()
    }
    fn scene_style(&self) -> ColoredString {
        self.as_str().scene_style()
    }
    fn signal_style(&self) -> ColoredString {
        self.as_str().signal_style()
    }
    fn operation_style(&self) -> ColoredString {
        self.as_str().operation_style()
    }
    fn error_style(&self) -> ColoredString {
        self.as_str().error_style()
    }
    fn section_style(&self) -> ColoredString {
        self.as_str().section_style()
    }
}
