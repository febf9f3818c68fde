//! Small presentation helpers shared by the `list`/`info` commands: the
//! human-readable byte-size rendering, `ls -l`-style mode strings, and the
//! gzip header OS byte's display name.

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut size = bytes as f64;
    let mut unit = 0usize;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

pub fn type_char(entry_type: zarc_tar::EntryType) -> char {
    use zarc_tar::EntryType::*;
    match entry_type {
        Regular => '-',
        HardLink => 'h',
        SymbolicLink => 'l',
        CharDevice => 'c',
        BlockDevice => 'b',
        Directory => 'd',
        Fifo => 'p',
        GnuLongName | GnuLongLink => 'L',
        Other(_) => '?',
    }
}

pub fn format_mode(mode: u32) -> String {
    const BITS: [(u32, char); 9] = [
        (0o400, 'r'), (0o200, 'w'), (0o100, 'x'),
        (0o040, 'r'), (0o020, 'w'), (0o010, 'x'),
        (0o004, 'r'), (0o002, 'w'), (0o001, 'x'),
    ];
    BITS.iter().map(|&(bit, ch)| if mode & bit != 0 { ch } else { '-' }).collect()
}

pub fn gzip_os_name(os: u8) -> &'static str {
    match os {
        0 => "FAT (MS-DOS)",
        1 => "Amiga",
        2 => "VMS",
        3 => "Unix",
        5 => "Atari TOS",
        6 => "HPFS (OS/2)",
        7 => "Macintosh",
        8 => "Z-System",
        9 => "CP/M",
        10 => "TOPS-20",
        11 => "NTFS",
        13 => "Acorn RISCOS",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_common_sizes() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1024), "1.0 KiB");
        assert_eq!(human_size(1536), "1.5 KiB");
        assert_eq!(human_size(10 * 1024 * 1024), "10.0 MiB");
    }

    #[test]
    fn formats_mode_bits() {
        assert_eq!(format_mode(0o755), "rwxr-xr-x");
        assert_eq!(format_mode(0o644), "rw-r--r--");
    }
}
