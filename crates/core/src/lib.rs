#![forbid(unsafe_code)]

pub mod model {
    use std::fmt;

    pub const DESCRIPTION_MAX_CHARS: usize = 250;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct BubbleId(i64);

    impl BubbleId {
        pub fn new(value: i64) -> Self {
            Self(value)
        }

        pub fn get(self) -> i64 {
            self.0
        }

        /// Accepts an integer-like query value such as `"12"` or `" 12 "`.
        pub fn parse(value: &str) -> Option<Self> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<i64>().ok().map(Self)
        }
    }

    impl fmt::Display for BubbleId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum DueBucket {
        Today,
        ThisWeek,
        Later,
    }

    impl DueBucket {
        /// Form choice order.
        pub const ALL: [DueBucket; 3] = [DueBucket::Today, DueBucket::ThisWeek, DueBucket::Later];

        pub fn label(self) -> &'static str {
            match self {
                DueBucket::Today => "Due today",
                DueBucket::ThisWeek => "Due this week",
                DueBucket::Later => "Due later(ish)",
            }
        }

        pub fn as_key(self) -> &'static str {
            match self {
                DueBucket::Today => "today",
                DueBucket::ThisWeek => "this_week",
                DueBucket::Later => "later",
            }
        }

        /// Exact label match; no trimming or case folding.
        pub fn from_label(value: &str) -> Option<Self> {
            Self::ALL.into_iter().find(|bucket| bucket.label() == value)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Bubble {
        pub id: BubbleId,
        pub description: String,
        pub due: DueBucket,
        pub is_complete: bool,
    }

    impl Bubble {
        pub fn is_active(&self) -> bool {
            !self.is_complete
        }
    }

    /// Active (not yet popped) bubbles split by due bucket.
    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    pub struct ActiveGroups {
        pub today: Vec<Bubble>,
        pub this_week: Vec<Bubble>,
        pub later: Vec<Bubble>,
    }

    impl ActiveGroups {
        pub fn partition(bubbles: impl IntoIterator<Item = Bubble>) -> Self {
            let mut groups = Self::default();
            for bubble in bubbles.into_iter().filter(Bubble::is_active) {
                match bubble.due {
                    DueBucket::Today => groups.today.push(bubble),
                    DueBucket::ThisWeek => groups.this_week.push(bubble),
                    DueBucket::Later => groups.later.push(bubble),
                }
            }
            groups
        }

        pub fn group(&self, due: DueBucket) -> &[Bubble] {
            match due {
                DueBucket::Today => &self.today,
                DueBucket::ThisWeek => &self.this_week,
                DueBucket::Later => &self.later,
            }
        }

        pub fn len(&self) -> usize {
            self.today.len() + self.this_week.len() + self.later.len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    pub fn completed(bubbles: impl IntoIterator<Item = Bubble>) -> Vec<Bubble> {
        bubbles
            .into_iter()
            .filter(|bubble| bubble.is_complete)
            .collect()
    }
}

pub mod form {
    use crate::model::{DESCRIPTION_MAX_CHARS, DueBucket};
    use std::fmt;

    pub const FIELD_DESCRIPTION: &str = "bubble_description";
    pub const FIELD_WHEN_DUE: &str = "when_due";
    pub const FIELD_CSRF_TOKEN: &str = "csrf_token";

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum FormError {
        DescriptionRequired,
        DescriptionTooLong,
        DescriptionMalformed,
        InvalidBucket,
        InvalidCsrfToken,
    }

    impl FormError {
        pub fn message(self) -> &'static str {
            match self {
                FormError::DescriptionRequired => "description required",
                FormError::DescriptionTooLong => "description too long (max 250 characters)",
                FormError::DescriptionMalformed => "description could not be decoded",
                FormError::InvalidBucket => "invalid bucket",
                FormError::InvalidCsrfToken => "The CSRF token is missing or invalid.",
            }
        }

        /// `None` for errors that belong to the form as a whole.
        pub fn field(self) -> Option<&'static str> {
            match self {
                FormError::DescriptionRequired
                | FormError::DescriptionTooLong
                | FormError::DescriptionMalformed => {
                    Some(FIELD_DESCRIPTION)
                }
                FormError::InvalidBucket => Some(FIELD_WHEN_DUE),
                FormError::InvalidCsrfToken => None,
            }
        }
    }

    impl fmt::Display for FormError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message())
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct ValidationError {
        pub errors: Vec<FormError>,
    }

    impl ValidationError {
        pub fn contains(&self, error: FormError) -> bool {
            self.errors.contains(&error)
        }
    }

    impl fmt::Display for ValidationError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let messages = self
                .errors
                .iter()
                .map(|err| err.message())
                .collect::<Vec<_>>();
            write!(f, "validation failed: {}", messages.join("; "))
        }
    }

    impl std::error::Error for ValidationError {}

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct ValidatedBubble {
        pub description: String,
        pub due: DueBucket,
    }

    pub fn validate(
        raw_description: &str,
        raw_bucket: &str,
    ) -> Result<ValidatedBubble, ValidationError> {
        let mut errors = Vec::new();

        let description = raw_description.trim();
        if description.is_empty() {
            errors.push(FormError::DescriptionRequired);
        } else if description.chars().count() > DESCRIPTION_MAX_CHARS {
            errors.push(FormError::DescriptionTooLong);
        }

        let due = DueBucket::from_label(raw_bucket);
        if due.is_none() {
            errors.push(FormError::InvalidBucket);
        }

        match due {
            Some(due) if errors.is_empty() => Ok(ValidatedBubble {
                description: description.to_string(),
                due,
            }),
            _ => Err(ValidationError { errors }),
        }
    }

    /// What the page renders into the creation form: the raw values plus any errors.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct BubbleForm {
        pub description: String,
        pub when_due: String,
        pub errors: Vec<FormError>,
    }

    impl BubbleForm {
        pub fn fresh() -> Self {
            Self {
                description: String::new(),
                when_due: DueBucket::Today.label().to_string(),
                errors: Vec::new(),
            }
        }

        pub fn rejected(description: &str, when_due: &str, errors: Vec<FormError>) -> Self {
            Self {
                description: description.to_string(),
                when_due: when_due.to_string(),
                errors,
            }
        }

        pub fn field_errors(&self, field: &str) -> Vec<FormError> {
            self.errors
                .iter()
                .copied()
                .filter(|err| err.field() == Some(field))
                .collect()
        }

        pub fn form_errors(&self) -> Vec<FormError> {
            self.errors
                .iter()
                .copied()
                .filter(|err| err.field().is_none())
                .collect()
        }
    }

    impl Default for BubbleForm {
        fn default() -> Self {
            Self::fresh()
        }
    }
}

#[cfg(test)]
mod tests;
