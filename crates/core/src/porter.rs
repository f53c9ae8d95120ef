// Classic Porter stemmer, with the `bli -> ble` and `logi -> log` step 2 rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

impl PorterStemmer {
    pub fn new() -> Self {
        Self
    }

    pub fn stem(&self, word: &str) -> String {
        let lower = word.to_ascii_lowercase();
        if lower.len() <= 2 || !lower.bytes().all(|byte| byte.is_ascii_lowercase()) {
            return lower;
        }

        let mut word = Word::new(lower.into_bytes());
        word.step1ab();
        if word.b.len() > 1 {
            word.step1c();
            word.step2();
            word.step3();
            word.step4();
            word.step5();
        }

        word.b.into_iter().map(char::from).collect()
    }
}

struct Word {
    b: Vec<u8>,
    // Length of the stem left after the most recent successful `ends` match.
    stem_len: usize,
}

impl Word {
    fn new(b: Vec<u8>) -> Self {
        let stem_len = b.len();
        Self { b, stem_len }
    }

    fn last(&self) -> usize {
        self.b.len() - 1
    }

    fn is_consonant(&self, i: usize) -> bool {
        match self.b[i] {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => i == 0 || !self.is_consonant(i - 1),
            _ => true,
        }
    }

    fn measure(&self) -> usize {
        let end = self.stem_len;
        let mut i = 0;
        let mut n = 0;

        while i < end && self.is_consonant(i) {
            i += 1;
        }

        loop {
            while i < end && !self.is_consonant(i) {
                i += 1;
            }
            if i >= end {
                return n;
            }
            n += 1;
            while i < end && self.is_consonant(i) {
                i += 1;
            }
            if i >= end {
                return n;
            }
        }
    }

    fn vowel_in_stem(&self) -> bool {
        (0..self.stem_len).any(|i| !self.is_consonant(i))
    }

    fn double_consonant(&self, i: usize) -> bool {
        i >= 1 && self.b[i] == self.b[i - 1] && self.is_consonant(i)
    }

    /// consonant-vowel-consonant ending at `i`, where the last consonant is not w, x or y.
    fn cvc(&self, i: usize) -> bool {
        if i < 2 || !self.is_consonant(i) || self.is_consonant(i - 1) || !self.is_consonant(i - 2) {
            return false;
        }
        !matches!(self.b[i], b'w' | b'x' | b'y')
    }

    fn ends(&mut self, suffix: &str) -> bool {
        if !self.b.ends_with(suffix.as_bytes()) {
            return false;
        }
        self.stem_len = self.b.len() - suffix.len();
        true
    }

    fn set_to(&mut self, replacement: &str) {
        self.b.truncate(self.stem_len);
        self.b.extend_from_slice(replacement.as_bytes());
    }

    fn replace_if_measured(&mut self, replacement: &str) {
        if self.measure() > 0 {
            self.set_to(replacement);
        }
    }

    fn step1ab(&mut self) {
        if self.b.last() == Some(&b's') {
            if self.ends("sses") {
                self.b.truncate(self.b.len() - 2);
            } else if self.ends("ies") {
                self.set_to("i");
            } else if self.b[self.last() - 1] != b's' {
                self.b.pop();
            }
        }

        if self.ends("eed") {
            if self.measure() > 0 {
                self.b.pop();
            }
        } else if (self.ends("ed") || self.ends("ing")) && self.vowel_in_stem() {
            self.b.truncate(self.stem_len);
            self.stem_len = self.b.len();
            if self.ends("at") {
                self.set_to("ate");
            } else if self.ends("bl") {
                self.set_to("ble");
            } else if self.ends("iz") {
                self.set_to("ize");
            } else if self.double_consonant(self.last()) {
                if !matches!(self.b[self.last()], b'l' | b's' | b'z') {
                    self.b.pop();
                }
            } else if self.measure() == 1 && self.cvc(self.last()) {
                self.stem_len = self.b.len();
                self.set_to("e");
            }
        }
    }

    fn step1c(&mut self) {
        if self.ends("y") && self.vowel_in_stem() {
            let last = self.last();
            self.b[last] = b'i';
        }
    }

    fn step2(&mut self) {
        const RULES: &[(&str, &str)] = &[
            ("ational", "ate"),
            ("tional", "tion"),
            ("enci", "ence"),
            ("anci", "ance"),
            ("izer", "ize"),
            ("bli", "ble"),
            ("alli", "al"),
            ("entli", "ent"),
            ("eli", "e"),
            ("ousli", "ous"),
            ("ization", "ize"),
            ("ation", "ate"),
            ("ator", "ate"),
            ("alism", "al"),
            ("iveness", "ive"),
            ("fulness", "ful"),
            ("ousness", "ous"),
            ("aliti", "al"),
            ("iviti", "ive"),
            ("biliti", "ble"),
            ("logi", "log"),
        ];
        self.apply_first(RULES);
    }

    fn step3(&mut self) {
        const RULES: &[(&str, &str)] = &[
            ("icate", "ic"),
            ("ative", ""),
            ("alize", "al"),
            ("iciti", "ic"),
            ("ical", "ic"),
            ("ful", ""),
            ("ness", ""),
        ];
        self.apply_first(RULES);
    }

    fn apply_first(&mut self, rules: &[(&str, &str)]) {
        for (suffix, replacement) in rules {
            if self.ends(suffix) {
                self.replace_if_measured(replacement);
                return;
            }
        }
    }

    fn step4(&mut self) {
        const SUFFIXES: &[&str] = &[
            "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion",
            "ou", "ism", "ate", "iti", "ous", "ive", "ize",
        ];

        for suffix in SUFFIXES {
            if !self.ends(suffix) {
                continue;
            }
            if *suffix == "ion"
                && !(self.stem_len > 0 && matches!(self.b[self.stem_len - 1], b's' | b't'))
            {
                return;
            }
            if self.measure() > 1 {
                self.b.truncate(self.stem_len);
            }
            return;
        }
    }

    fn step5(&mut self) {
        self.stem_len = self.b.len();
        // Measured once: dropping a final `e` never changes m.
        let m = self.measure();

        let last = self.last();
        if self.b[last] == b'e' && (m > 1 || (m == 1 && !self.cvc(last - 1))) {
            self.b.pop();
        }

        let last = self.last();
        if self.b[last] == b'l' && self.double_consonant(last) && m > 1 {
            self.b.pop();
        }
    }
}
