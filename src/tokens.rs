// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation of the display token table

use std::sync::LazyLock;

/// Lookup table from panel display tokens to text.
///
/// The panel never sends ASCII for zone names or touchpad text. Each byte is a
/// token that expands to a character, a whole word (with its trailing space)
/// or a formatting control. Tables are plain data so a panel with different
/// firmware strings can be served by injecting another table.
#[derive(Debug, Clone)]
pub struct TokenTable {
    entries: [Option<&'static str>; 256],
}

impl TokenTable {
    /// An empty table; every token renders as a placeholder.
    pub fn empty() -> Self {
        Self { entries: [None; 256] }
    }

    /// Build a table from `(token, text)` pairs. Later pairs win.
    pub fn from_entries(entries: &[(u8, &'static str)]) -> Self {
        let mut table = Self::empty();
        for &(token, text) in entries {
            table.entries[token as usize] = Some(text);
        }
        table
    }

    /// The compiled-in table for Concord-family firmware.
    pub fn concord() -> &'static TokenTable {
        &CONCORD_TABLE
    }

    /// Text for a single token, if the table knows it.
    pub fn get(&self, token: u8) -> Option<&'static str> {
        self.entries[token as usize]
    }

    /// Decode a token sequence into display text.
    ///
    /// Never fails: unknown tokens render as `<XX>`. Trailing whitespace left
    /// by word tokens is trimmed.
    pub fn decode(&self, tokens: &[u8]) -> String {
        let mut out = String::with_capacity(tokens.len() * 2);
        for &token in tokens {
            match self.get(token) {
                Some(text) => out.push_str(text),
                None => out.push_str(&format!("<{token:02X}>")),
            }
        }
        out.truncate(out.trim_end().len());
        out
    }
}

impl Default for TokenTable {
    fn default() -> Self {
        CONCORD_TABLE.clone()
    }
}

static CONCORD_TABLE: LazyLock<TokenTable> = LazyLock::new(|| {
    let mut table = TokenTable::from_entries(CONCORD_WORDS);
    for d in 0..10u8 {
        table.entries[d as usize] = Some(DIGITS[d as usize]);
    }
    for l in 0..26u8 {
        table.entries[(0x11 + l) as usize] = Some(LETTERS[l as usize]);
    }
    table
});

const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

const LETTERS: [&str; 26] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M",
    "N", "O", "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
];

/// Punctuation, vocabulary and control tokens.
const CONCORD_WORDS: &[(u8, &str)] = &[
    (0x0C, "#"),
    (0x0D, ":"),
    (0x0E, "/"),
    (0x0F, "?"),
    (0x10, "."),
    (0x2B, " "),
    (0x2C, "'"),
    (0x2D, "-"),
    (0x2E, "_"),
    (0x2F, "*"),
    (0x30, "AC POWER "),
    (0x31, "ACCESS "),
    (0x32, "ACCOUNT "),
    (0x33, "ALARM "),
    (0x34, "ALL "),
    (0x35, "ARM "),
    (0x36, "ARMING "),
    (0x37, "AREA "),
    (0x38, "ATTIC "),
    (0x39, "AUTO "),
    (0x3A, "AUXILIARY "),
    (0x3B, "AWAY "),
    (0x3C, "BACK "),
    (0x3D, "BATTERY "),
    (0x3E, "BEDROOM "),
    (0x3F, "BEEPS "),
    (0x40, "BOTTOM "),
    (0x41, "BREEZEWAY "),
    (0x42, "BASEMENT "),
    (0x43, "BATHROOM "),
    (0x44, "BUS "),
    (0x45, "BYPASS "),
    (0x46, "BYPASSED "),
    (0x47, "CABINET "),
    (0x48, "CANCELED "),
    (0x49, "CARPET "),
    (0x4A, "CHIME "),
    (0x4B, "CLOSET "),
    (0x4C, "CLOSING "),
    (0x4D, "CODE "),
    (0x4E, "CONTROL "),
    (0x4F, "CPU "),
    (0x50, "DEGREES "),
    (0x51, "DEN "),
    (0x52, "DESK "),
    (0x53, "DELAY "),
    (0x54, "DELETE "),
    (0x55, "DINING "),
    (0x56, "DIRECT "),
    (0x57, "DOOR "),
    (0x58, "DOWN "),
    (0x59, "DOWNLOAD "),
    (0x5A, "DOWNSTAIRS "),
    (0x5B, "DRAWER "),
    (0x5C, "DISPLAY "),
    (0x5D, "DURESS "),
    (0x5E, "EAST "),
    (0x5F, "ENERGY SAVER "),
    (0x60, "ENTER "),
    (0x61, "ENTRY "),
    (0x62, "ERROR "),
    (0x63, "EXIT "),
    (0x64, "FAIL "),
    (0x65, "FAILURE "),
    (0x66, "FAMILY "),
    (0x67, "FEATURES "),
    (0x68, "FIRE "),
    (0x69, "FIRST "),
    (0x6A, "FLOOR "),
    (0x6B, "FORCE "),
    (0x6C, "FORMAT "),
    (0x6D, "FREEZE "),
    (0x6E, "FRONT "),
    (0x6F, "FURNACE "),
    (0x70, "GARAGE "),
    (0x71, "GALLERY "),
    (0x72, "GOODBYE "),
    (0x73, "GROUP "),
    (0x74, "HALL "),
    (0x75, "HEAT "),
    (0x76, "HELLO "),
    (0x77, "HELP "),
    (0x78, "HIGH "),
    (0x79, "HOURLY "),
    (0x7A, "HOUSE "),
    (0x7B, "IMMEDIATE "),
    (0x7C, "IN SERVICE "),
    (0x7D, "INTERIOR "),
    (0x7E, "INTRUSION "),
    (0x7F, "INVALID "),
    (0x80, "IS "),
    (0x81, "KEY "),
    (0x82, "KITCHEN "),
    (0x83, "LAUNDRY "),
    (0x84, "LEARN "),
    (0x85, "LEFT "),
    (0x86, "LIBRARY "),
    (0x87, "LEVEL "),
    (0x88, "LIGHT "),
    (0x89, "LIGHTS "),
    (0x8A, "LIVING "),
    (0x8B, "LOW "),
    (0x8C, "MAIN "),
    (0x8D, "MASTER "),
    (0x8E, "MEDICAL "),
    (0x8F, "MEMORY "),
    (0x90, "MIN "),
    (0x91, "MODE "),
    (0x92, "MOTION "),
    (0x93, "NIGHT "),
    (0x94, "NORTH "),
    (0x95, "NOT "),
    (0x96, "NUMBER "),
    (0x97, "OFF "),
    (0x98, "OFFICE "),
    (0x99, "OK "),
    (0x9A, "ON "),
    (0x9B, "OPEN "),
    (0x9C, "OPENING "),
    (0x9D, "PANIC "),
    (0x9E, "PARTITION "),
    (0x9F, "PATIO "),
    (0xA0, "PHONE "),
    (0xA1, "POLICE "),
    (0xA2, "POOL "),
    (0xA3, "PORCH "),
    (0xA4, "PRESS "),
    (0xA5, "QUIET "),
    (0xA6, "QUICK "),
    (0xA7, "RECEIVER "),
    (0xA8, "REAR "),
    (0xA9, "REPORT "),
    (0xAA, "REMOTE "),
    (0xAB, "RESTORE "),
    (0xAC, "RIGHT "),
    (0xAD, "ROOM "),
    (0xAE, "SCHEDULE "),
    (0xAF, "SCRIPT "),
    (0xB0, "SEC "),
    (0xB1, "SECOND "),
    (0xB2, "SET "),
    (0xB3, "SENSOR "),
    (0xB4, "SHOCK "),
    (0xB5, "SIDE "),
    (0xB6, "SIREN "),
    (0xB7, "SLIDING "),
    (0xB8, "SMOKE "),
    (0xB9, "Sn "),
    (0xBA, "SOUND "),
    (0xBB, "SOUTH "),
    (0xBC, "SPECIAL "),
    (0xBD, "STAIRS "),
    (0xBE, "START "),
    (0xBF, "STATUS "),
    (0xC0, "STAY "),
    (0xC1, "STOP "),
    (0xC2, "SUPERVISORY "),
    (0xC3, "SYSTEM "),
    (0xC4, "TAMPER "),
    (0xC5, "TEMPERATURE "),
    (0xC6, "TEMPORARY "),
    (0xC7, "TEST "),
    (0xC8, "TIME "),
    (0xC9, "TIMEOUT "),
    (0xCA, "TOUCHPAD "),
    (0xCB, "TRIP "),
    (0xCC, "TROUBLE "),
    (0xCD, "UNBYPASS "),
    (0xCE, "UNIT "),
    (0xCF, "UP "),
    (0xD0, "VERIFY "),
    (0xD1, "VIOLATION "),
    (0xD2, "WARNING "),
    (0xD3, "WEST "),
    (0xD4, "WINDOW "),
    (0xD5, "MENU "),
    (0xD6, "RETURN "),
    (0xD7, "POUND "),
    (0xD8, "HOME "),
    // Formatting controls
    (0xF9, "\n"),
    (0xFA, " "),
    (0xFB, "\n"),
    (0xFD, ""),
    (0xFE, ""),
];

/// Decode tokens with the compiled-in Concord table.
pub fn decode_tokens(tokens: &[u8]) -> String {
    TokenTable::concord().decode(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_and_letters() {
        assert_eq!(decode_tokens(&[0x01, 0x02, 0x09]), "129");
        assert_eq!(decode_tokens(&[0x11, 0x12, 0x2A]), "ABZ");
    }

    #[test]
    fn test_words_and_letters() {
        // G A R D E N <space> MOTION
        let tokens = [0x17, 0x11, 0x22, 0x14, 0x15, 0x1E, 0x2B, 0x92];
        assert_eq!(decode_tokens(&tokens), "GARDEN MOTION");
    }

    #[test]
    fn test_word_sequence_keeps_inner_spacing() {
        assert_eq!(decode_tokens(&[0x6E, 0x57]), "FRONT DOOR");
        assert_eq!(decode_tokens(&[0x42, 0xD4, 0x02]), "BASEMENT WINDOW 2");
    }

    #[test]
    fn test_unknown_token_placeholder() {
        assert_eq!(decode_tokens(&[0x11, 0xE0, 0x12]), "A<E0>B");
    }

    #[test]
    fn test_control_tokens() {
        assert_eq!(decode_tokens(&[0x33, 0xF9, 0x68]), "ALARM \nFIRE");
        assert_eq!(decode_tokens(&[0xFE, 0x11, 0xFE]), "A");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(decode_tokens(&[]), "");
    }

    #[test]
    fn test_injected_table() {
        let table = TokenTable::from_entries(&[(0x01, "ONE "), (0x02, "TWO")]);
        assert_eq!(table.decode(&[0x01, 0x02]), "ONE TWO");
        assert_eq!(table.decode(&[0x11]), "<11>");
        assert_eq!(TokenTable::empty().decode(&[0x00]), "<00>");
    }
}
