use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "C99")]
    C99,
    #[serde(rename = "CPP17")]
    Cpp17,
    #[serde(rename = "JAVA11")]
    Java11,
    #[serde(rename = "PYTHON3")]
    Python3,
    #[serde(rename = "CS")]
    CSharp,
}

/// Toolchain entry for one language. A missing compile command means the
/// language is interpreted and has no compile stage.
#[derive(Debug)]
pub struct LanguageConfig {
    pub source_file: &'static str,
    pub compile: Option<&'static str>,
    pub run: &'static str,
}

static C99: LanguageConfig = LanguageConfig {
    source_file: "Main.c",
    compile: Some("gcc -O2 -std=c99 Main.c -o Main"),
    run: "./Main",
};

static CPP17: LanguageConfig = LanguageConfig {
    source_file: "Main.cpp",
    compile: Some("g++ -O2 -std=c++17 Main.cpp -o Main"),
    run: "./Main",
};

static JAVA11: LanguageConfig = LanguageConfig {
    source_file: "Main.java",
    compile: Some("javac Main.java"),
    run: "java Main",
};

static PYTHON3: LanguageConfig = LanguageConfig {
    source_file: "Main.py",
    compile: None,
    run: "python3 Main.py",
};

static CSHARP: LanguageConfig = LanguageConfig {
    source_file: "Main.cs",
    compile: Some("mcs -optimize+ -out:Main.exe Main.cs"),
    run: "mono Main.exe",
};

impl Language {
    pub fn config(self) -> &'static LanguageConfig {
        match self {
            Language::C99 => &C99,
            Language::Cpp17 => &CPP17,
            Language::Java11 => &JAVA11,
            Language::Python3 => &PYTHON3,
            Language::CSharp => &CSHARP,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::C99 => "C99",
            Language::Cpp17 => "CPP17",
            Language::Java11 => "JAVA11",
            Language::Python3 => "PYTHON3",
            Language::CSharp => "CS",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "C99" | "C" => Ok(Language::C99),
            "CPP17" | "CPP" | "C++" => Ok(Language::Cpp17),
            "JAVA11" | "JAVA" => Ok(Language::Java11),
            "PYTHON3" | "PYTHON" | "PY" => Ok(Language::Python3),
            "CS" | "CSHARP" | "C#" => Ok(Language::CSharp),
            _ => Err(Error::Argument(format!("unknown language `{}`", value))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpreted_languages_have_no_compile_stage() {
        assert!(Language::Python3.config().compile.is_none());
        assert!(Language::Cpp17.config().compile.is_some());
    }

    #[test]
    fn wire_names_round_trip() {
        let decoded: Language = serde_json::from_str("\"CPP17\"").unwrap();
        assert_eq!(decoded, Language::Cpp17);
        assert_eq!(serde_json::to_string(&Language::CSharp).unwrap(), "\"CS\"");
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("c++".parse::<Language>().unwrap(), Language::Cpp17);
        assert!("cobol".parse::<Language>().is_err());
    }
}
