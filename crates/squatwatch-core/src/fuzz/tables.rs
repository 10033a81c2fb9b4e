// Static lookup tables for the mutation rules.

/// QWERTY neighbours of each key
pub(crate) const QWERTY: &[(char, &str)] = &[
    ('1', "2q"),
    ('2', "3wq1"),
    ('3', "4ew2"),
    ('4', "5re3"),
    ('5', "6tr4"),
    ('6', "7yt5"),
    ('7', "8uy6"),
    ('8', "9iu7"),
    ('9', "0oi8"),
    ('0', "po9"),
    ('q', "12wa"),
    ('w', "3esaq2"),
    ('e', "4rdsw3"),
    ('r', "5tfde4"),
    ('t', "6ygfr5"),
    ('y', "7uhgt6"),
    ('u', "8ijhy7"),
    ('i', "9okju8"),
    ('o', "0plki9"),
    ('p', "lo0"),
    ('a', "qwsz"),
    ('s', "edxzaw"),
    ('d', "rfcxse"),
    ('f', "tgvcdr"),
    ('g', "yhbvft"),
    ('h', "ujnbgy"),
    ('j', "ikmnhu"),
    ('k', "olmji"),
    ('l', "kop"),
    ('z', "asx"),
    ('x', "zsdc"),
    ('c', "xdfv"),
    ('v', "cfgb"),
    ('b', "vghn"),
    ('n', "bhjm"),
    ('m', "njk"),
];

/// ASCII look-alikes for single characters
pub(crate) const GLYPHS: &[(char, &[&str])] = &[
    ('a', &["4", "o"]),
    ('b', &["d", "6", "lb"]),
    ('c', &["e"]),
    ('d', &["b", "cl"]),
    ('e', &["3", "c"]),
    ('g', &["q", "9"]),
    ('h', &["lh", "n"]),
    ('i', &["1", "l"]),
    ('j', &["i"]),
    ('k', &["lk", "ik"]),
    ('l', &["1", "i"]),
    ('m', &["n", "rn", "nn"]),
    ('n', &["m", "r"]),
    ('o', &["0"]),
    ('q', &["g"]),
    ('s', &["5"]),
    ('t', &["7"]),
    ('u', &["v"]),
    ('v', &["u"]),
    ('w', &["vv"]),
    ('z', &["2"]),
];

/// Multi-character sequences and the character they imitate
pub(crate) const SEQUENCE_GLYPHS: &[(&str, &str)] = &[
    ("rn", "m"),
    ("nn", "m"),
    ("vv", "w"),
    ("cl", "d"),
];

pub(crate) const VOWELS: &str = "aeiou";

/// Public suffixes made of two labels
pub(crate) const MULTI_LABEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "me.uk", "ac.uk", "gov.uk", "com.au", "net.au", "org.au", "co.nz",
    "co.jp", "ne.jp", "co.kr", "co.za", "co.in", "com.br", "com.mx", "com.ar", "com.cn",
    "com.tr", "com.sg", "com.hk", "co.il",
];

/// TLDs used by the `tld-swap` rule
pub(crate) const SWAP_TLDS: &[&str] = &[
    "com", "net", "org", "info", "biz", "co", "io", "us", "uk", "de", "eu", "fr", "nl", "ru",
    "cn", "in", "br", "au", "ca", "es", "it", "ch", "se", "no", "pl", "jp", "me", "tv", "cc",
    "xyz", "online", "site", "app", "dev", "shop", "store", "cloud", "top", "live",
];

pub(crate) fn qwerty_neighbours(c: char) -> &'static str {
    QWERTY
        .iter()
        .find(|(key, _)| *key == c)
        .map(|(_, neighbours)| *neighbours)
        .unwrap_or("")
}

pub(crate) fn glyphs(c: char) -> &'static [&'static str] {
    GLYPHS
        .iter()
        .find(|(key, _)| *key == c)
        .map(|(_, glyphs)| *glyphs)
        .unwrap_or(&[])
}
