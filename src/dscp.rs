//! DSCP name to TOS-byte lookup, and the `dscptable` subcommand's report.
//!
//! The 64-entry table assigns every codepoint a name: the well-known class
//! selectors (`cs1`..`cs5`), assured/expedited forwarding (`af11`..`af43`,
//! `ef`), network control (`nc1`, `nc2`), best-effort (`be`), and `cpN` for
//! every codepoint none of those cover.

/// Maps a DSCP name to its 6-bit codepoint, or `None` if unrecognized.
pub fn lookup(name: &str) -> Option<u8> {
    TABLE.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)
}

/// The TOS byte for a DSCP codepoint: the 6-bit value shifted into the
/// high bits of the IPv4 TOS / IPv6 traffic-class octet.
pub fn tos_byte(codepoint: u8) -> u8 {
    codepoint << 2
}

/// Prints the fixed DSCP name / codepoint / TOS table and exits 0.
pub fn print_table() {
    println!();
    println!("============================================================");
    println!("DSCP Mapping");
    println!("============================================================");
    println!("DSCP Name      DSCP Value     TOS (bin)      TOS (hex)");
    println!("------------------------------------------------------------");
    for (name, code) in TABLE {
        let tos = tos_byte(*code);
        println!("{:<15}{:<15}{:08b}{:<6}{:02X}", name, code, tos, "", tos);
    }
    println!();
}

const TABLE: &[(&str, u8)] = &[
    ("be", 0),
    ("cp1", 1),
    ("cp2", 2),
    ("cp3", 3),
    ("cp4", 4),
    ("cp5", 5),
    ("cp6", 6),
    ("cp7", 7),
    ("cs1", 8),
    ("cp9", 9),
    ("af11", 10),
    ("cp11", 11),
    ("af12", 12),
    ("cp13", 13),
    ("af13", 14),
    ("cp15", 15),
    ("cs2", 16),
    ("cp17", 17),
    ("af21", 18),
    ("cp19", 19),
    ("af22", 20),
    ("cp21", 21),
    ("af23", 22),
    ("cp23", 23),
    ("cs3", 24),
    ("cp25", 25),
    ("af31", 26),
    ("cp27", 27),
    ("af32", 28),
    ("cp29", 29),
    ("af33", 30),
    ("cp31", 31),
    ("cs4", 32),
    ("cp33", 33),
    ("af41", 34),
    ("cp35", 35),
    ("af42", 36),
    ("cp37", 37),
    ("af43", 38),
    ("cp39", 39),
    ("cs5", 40),
    ("cp41", 41),
    ("cp42", 42),
    ("cp43", 43),
    ("cp44", 44),
    ("cp45", 45),
    ("ef", 46),
    ("cp47", 47),
    ("nc1", 48),
    ("cp49", 49),
    ("cp50", 50),
    ("cp51", 51),
    ("cp52", 52),
    ("cp53", 53),
    ("cp54", 54),
    ("cp55", 55),
    ("nc2", 56),
    ("cp57", 57),
    ("cp58", 58),
    ("cp59", 59),
    ("cp60", 60),
    ("cp61", 61),
    ("cp62", 62),
    ("cp63", 63),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_64_entries() {
        assert_eq!(TABLE.len(), 64);
    }

    #[test]
    fn known_names_resolve() {
        assert_eq!(lookup("be"), Some(0));
        assert_eq!(lookup("ef"), Some(46));
        assert_eq!(lookup("cs1"), Some(8));
        assert_eq!(lookup("af11"), Some(10));
        assert_eq!(lookup("nc2"), Some(56));
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(lookup("bogus"), None);
    }

    #[test]
    fn tos_byte_shifts_by_two() {
        assert_eq!(tos_byte(46), 184);
        assert_eq!(tos_byte(0), 0);
    }
}
