//! Best-effort language-mismatch screening
//!
//! Substring scan that catches the common case of C code submitted with the
//! C++ language selected, before a compile cycle is spent on it. This is
//! advisory pattern matching, not a parser; it sits outside the compile/run
//! pipeline and can be disabled via [`Config::language_screen`].
//!
//! [`Config::language_screen`]: crate::config::Config::language_screen

use crate::types::Language;

const CPP_INDICATORS: &[&str] = &[
    "iostream",
    "fstream",
    "sstream",
    "cout",
    "cin",
    "endl",
    "std::",
    "using namespace",
    "class ",
    "public:",
    "private:",
    "protected:",
    "template<",
    "nullptr",
    "<vector>",
    "<string>",
    "<map>",
    "<set>",
    "<algorithm>",
    "new ",
    "delete ",
];

const C_ONLY_INDICATORS: &[&str] = &["printf", "scanf", "stdio.h", "stdlib.h", "malloc", "free("];

/// Advice returned to the user when their submission looks mismatched
pub const MISMATCH_ADVICE: &str = "You selected C++ but your code appears to be C \
(using printf/scanf/stdio.h).\n\n\
Either:\n\
1. Switch to C language, or\n\
2. Use C++ features (iostream, cout, cin, etc.)";

/// Screen source text against the selected language.
///
/// Returns advice when the selection is C++ but the source shows only
/// C idioms and no C++ indicator. C submissions are never rejected:
/// C-style code is valid C++ often enough that the inverse check would
/// produce false positives.
pub fn screen(code: &str, language: Language) -> Option<&'static str> {
    if language != Language::Cpp {
        return None;
    }

    let has_cpp_features = CPP_INDICATORS.iter().any(|ind| code.contains(ind));
    let has_c_style = C_ONLY_INDICATORS.iter().any(|ind| code.contains(ind));

    if has_c_style && !has_cpp_features {
        Some(MISMATCH_ADVICE)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C_SOURCE: &str = r#"
#include <stdio.h>
int main() {
    printf("hello\n");
    return 0;
}
"#;

    const CPP_SOURCE: &str = r#"
#include <iostream>
int main() {
    std::cout << "hello" << std::endl;
    return 0;
}
"#;

    #[test]
    fn c_code_as_cpp_is_flagged() {
        assert!(screen(C_SOURCE, Language::Cpp).is_some());
    }

    #[test]
    fn cpp_code_as_cpp_passes() {
        assert!(screen(CPP_SOURCE, Language::Cpp).is_none());
    }

    #[test]
    fn c_selection_is_never_screened() {
        assert!(screen(C_SOURCE, Language::C).is_none());
        assert!(screen(CPP_SOURCE, Language::C).is_none());
    }

    #[test]
    fn mixed_code_as_cpp_passes() {
        // printf in otherwise-C++ code is common and legal
        let mixed = "#include <iostream>\n#include <stdio.h>\nint main() { printf(\"x\"); std::cout << 1; }";
        assert!(screen(mixed, Language::Cpp).is_none());
    }

    #[test]
    fn neutral_code_passes() {
        let neutral = "int main() { return 0; }";
        assert!(screen(neutral, Language::Cpp).is_none());
    }
}
