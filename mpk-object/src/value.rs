#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MpkValueList(Vec<MpkValue>);

impl std::fmt::Display for MpkValueList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut string = String::new();
        for value in &self.0 {
            string.push_str(&format!("{} ", value));
        }
        write!(f, "{}", string.trim_end())
    }
}

impl std::ops::Deref for MpkValueList {
    type Target = Vec<MpkValue>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for MpkValueList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<MpkValue>> for MpkValueList {
    fn from(v: Vec<MpkValue>) -> Self {
        Self(v)
    }
}

impl<'a> FromIterator<&'a str> for MpkValueList {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self(iter.into_iter().map(MpkValue::from).collect())
    }
}

impl FromIterator<String> for MpkValueList {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self(iter.into_iter().map(MpkValue::from).collect())
    }
}

/// A single command token.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum MpkValue {
    Int(isize),
    Symbol(String),
}

impl From<isize> for MpkValue {
    fn from(v: isize) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for MpkValue {
    fn from(v: i32) -> Self {
        Self::Int(v as isize)
    }
}

// Only text which prints back the same becomes an integer, so "007" or "+5"
// keep their spelling when used as a title or a name.
impl From<&str> for MpkValue {
    fn from(s: &str) -> Self {
        match canonical_int(s) {
            Some(v) => Self::Int(v),
            None => Self::Symbol(s.to_owned()),
        }
    }
}

impl From<String> for MpkValue {
    fn from(s: String) -> Self {
        match canonical_int(&s) {
            Some(v) => Self::Int(v),
            None => Self::Symbol(s),
        }
    }
}

fn canonical_int(s: &str) -> Option<isize> {
    s.parse::<isize>().ok().filter(|v| v.to_string() == s)
}

impl std::fmt::Display for MpkValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Symbol(v) => write!(f, "{}", v),
        }
    }
}
