use icu_casemap::CaseMapper;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single code-point transformation.
///
/// The set is closed; a [`Pipeline`] dispatches over it with one `match`.
/// Case mappings never change whether a code point is whitespace, so trim
/// decisions come out the same whichever order the list is given in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transform {
    /// Simple Unicode uppercase mapping, one code point to one.
    #[serde(rename = "upper_case")]
    ToUpper,
    #[serde(rename = "lower_case")]
    ToLower,
    #[serde(rename = "trim_spaces")]
    TrimSpaces,
}

impl Transform {
    pub fn name(self) -> &'static str {
        match self {
            Transform::ToUpper => "upper_case",
            Transform::ToLower => "lower_case",
            Transform::TrimSpaces => "trim_spaces",
        }
    }

    pub fn is_case_mapping(self) -> bool {
        matches!(self, Transform::ToUpper | Transform::ToLower)
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown conversion: {0}")]
pub struct UnknownTransform(pub String);

impl FromStr for Transform {
    type Err = UnknownTransform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upper_case" => Ok(Transform::ToUpper),
            "lower_case" => Ok(Transform::ToLower),
            "trim_spaces" => Ok(Transform::TrimSpaces),
            other => Err(UnknownTransform(other.to_string())),
        }
    }
}

/// Whether leading whitespace of the stream has been passed.
///
/// Starts out false and flips to true, permanently, at the first
/// non-whitespace code point seen by a `TrimSpaces` step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrimState {
    leading_trim_done: bool,
}

impl TrimState {
    pub fn leading_trim_done(self) -> bool {
        self.leading_trim_done
    }
}

/// Outcome of running one code point through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Keep(char),
    Drop,
}

/// Ordered list of transforms applied to each decoded code point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    transforms: Vec<Transform>,
}

impl Pipeline {
    pub fn new(transforms: impl Into<Vec<Transform>>) -> Self {
        Self {
            transforms: transforms.into(),
        }
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// True when a `TrimSpaces` step is configured.
    pub fn trims_spaces(&self) -> bool {
        self.transforms.contains(&Transform::TrimSpaces)
    }

    /// Applies every transform in order.
    ///
    /// Re-applying the same code point with the resulting state gives the same
    /// answer, which lets a rejected code point be retried in the next block.
    pub fn apply(&self, ch: char, state: &mut TrimState) -> Action {
        let mut ch = ch;
        for transform in &self.transforms {
            match transform {
                Transform::ToUpper => ch = CaseMapper::new().simple_uppercase(ch),
                Transform::ToLower => ch = CaseMapper::new().simple_lowercase(ch),
                Transform::TrimSpaces => {
                    if !ch.is_whitespace() {
                        state.leading_trim_done = true;
                    } else if !state.leading_trim_done {
                        return Action::Drop;
                    }
                }
            }
        }
        Action::Keep(ch)
    }

    /// Accounts for an invalid byte span passing through.
    ///
    /// Raw bytes are not whitespace, so they end leading trim like any other
    /// content; no case mapping applies to them.
    pub fn observe_raw(&self, state: &mut TrimState) {
        if self.trims_spaces() {
            state.leading_trim_done = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn run(pipeline: &Pipeline, input: &str) -> String {
        let mut state = TrimState::default();
        input
            .chars()
            .filter_map(|c| match pipeline.apply(c, &mut state) {
                Action::Keep(c) => Some(c),
                Action::Drop => None,
            })
            .collect()
    }

    #[rstest]
    #[case("upper_case", Transform::ToUpper)]
    #[case("lower_case", Transform::ToLower)]
    #[case("trim_spaces", Transform::TrimSpaces)]
    fn parses_and_displays_names(#[case] name: &str, #[case] expected: Transform) {
        let parsed: Transform = name.parse().unwrap();
        assert_eq!(parsed, expected);
        assert_eq!(parsed.to_string(), name);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "title_case".parse::<Transform>().unwrap_err();
        assert_eq!(err, UnknownTransform("title_case".to_string()));
        assert_eq!(err.to_string(), "unknown conversion: title_case");
    }

    #[test]
    fn serde_uses_conversion_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            conv: Vec<Transform>,
        }

        let parsed: Wrapper = toml::from_str(r#"conv = ["trim_spaces", "upper_case"]"#).unwrap();
        assert_eq!(parsed.conv, vec![Transform::TrimSpaces, Transform::ToUpper]);
    }

    #[rstest]
    #[case(Transform::ToUpper, "héllo wörld", "HÉLLO WÖRLD")]
    #[case(Transform::ToLower, "ÀÉÎ ΣΑΣ", "àéî σασ")]
    #[case(Transform::ToUpper, "123 !?", "123 !?")]
    fn case_mapping(#[case] transform: Transform, #[case] input: &str, #[case] expected: &str) {
        assert_eq!(run(&Pipeline::new([transform]), input), expected);
    }

    // Simple mappings from UnicodeData: one code point in, one out
    #[rstest]
    #[case(Transform::ToLower, "İ", "i")]
    #[case(Transform::ToLower, "İᾳ", "iᾳ")]
    #[case(Transform::ToUpper, "ᾳ", "ᾼ")]
    #[case(Transform::ToUpper, "straße", "STRAßE")]
    #[case(Transform::ToUpper, "ǆ", "Ǆ")]
    fn simple_case_mapping(
        #[case] transform: Transform,
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(run(&Pipeline::new([transform]), input), expected);
    }

    #[test]
    fn leading_whitespace_is_dropped_until_first_text() {
        let pipeline = Pipeline::new([Transform::TrimSpaces]);
        let mut state = TrimState::default();

        assert_eq!(pipeline.apply(' ', &mut state), Action::Drop);
        assert_eq!(pipeline.apply('\t', &mut state), Action::Drop);
        assert!(!state.leading_trim_done());

        assert_eq!(pipeline.apply('x', &mut state), Action::Keep('x'));
        assert!(state.leading_trim_done());

        assert_eq!(pipeline.apply(' ', &mut state), Action::Keep(' '));
    }

    #[test]
    fn unicode_whitespace_counts_for_trimming() {
        let pipeline = Pipeline::new([Transform::TrimSpaces]);
        assert_eq!(run(&pipeline, "\u{00A0}\u{3000}\n x"), "x");
    }

    #[test]
    fn trim_state_is_untouched_without_trim_step() {
        let pipeline = Pipeline::new([Transform::ToUpper]);
        let mut state = TrimState::default();
        assert_eq!(pipeline.apply('a', &mut state), Action::Keep('A'));
        assert!(!state.leading_trim_done());
    }

    #[test]
    fn order_of_trim_and_case_does_not_matter() {
        let input = "  \tMixed Case Text ";
        let a = Pipeline::new([Transform::TrimSpaces, Transform::ToLower]);
        let b = Pipeline::new([Transform::ToLower, Transform::TrimSpaces]);
        assert_eq!(run(&a, input), run(&b, input));
    }

    #[test]
    fn reapplying_a_code_point_is_stable() {
        let pipeline = Pipeline::new([Transform::TrimSpaces, Transform::ToUpper]);
        let mut state = TrimState::default();
        let first = pipeline.apply('q', &mut state);
        let second = pipeline.apply('q', &mut state);
        assert_eq!(first, second);
    }

    #[test]
    fn raw_bytes_end_leading_trim() {
        let pipeline = Pipeline::new([Transform::TrimSpaces]);
        let mut state = TrimState::default();
        pipeline.observe_raw(&mut state);
        assert!(state.leading_trim_done());

        let mut untouched = TrimState::default();
        Pipeline::new([Transform::ToUpper]).observe_raw(&mut untouched);
        assert!(!untouched.leading_trim_done());
    }

    #[test]
    fn trims_spaces_reports_configuration() {
        assert!(Pipeline::new([Transform::ToLower, Transform::TrimSpaces]).trims_spaces());
        assert!(!Pipeline::new([Transform::ToLower]).trims_spaces());
        assert!(!Pipeline::default().trims_spaces());
    }
}
