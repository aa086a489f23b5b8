use thiserror::Error;

pub const MIN_POSTCODE_LEN: usize = 4;

// DO NOT MODIFY the messages - clients match on them
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Postcode and street number fields mandatory!")]
    MissingField,
    #[error("Postcode must be at least 4 digits!")]
    TooShort,
    #[error("{} must be all digits and non negative!", .0.label())]
    NotNumeric(Field),
}

impl ValidationError {
    pub fn status(&self) -> u16 {
        400
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    Postcode,
    StreetNumber,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Postcode => "Postcode",
            Self::StreetNumber => "Street Number",
        }
    }
}

/// Input that made it through every rule, unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressQuery {
    pub postcode: String,
    pub streetnumber: String,
}

enum Rule {
    Present,
    MinLength(Field, usize),
    Digits(Field),
}

// evaluated in order, first failure wins
const RULES: &[Rule] = &[
    Rule::Present,
    Rule::MinLength(Field::Postcode, MIN_POSTCODE_LEN),
    Rule::Digits(Field::Postcode),
    Rule::Digits(Field::StreetNumber),
];

struct Input<'a> {
    postcode: Option<&'a str>,
    streetnumber: Option<&'a str>,
}

impl Input<'_> {
    fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Postcode => self.postcode,
            Field::StreetNumber => self.streetnumber,
        }
    }
}

impl Rule {
    fn check(&self, input: &Input) -> Result<(), ValidationError> {
        match self {
            Self::Present => {
                let present = |field| input.get(field).is_some_and(|v| !v.is_empty());
                if !(present(Field::Postcode) && present(Field::StreetNumber)) {
                    return Err(ValidationError::MissingField);
                }
                Ok(())
            }
            // lengths are counted in UTF-16 units, as browser clients count them
            Self::MinLength(field, min) => {
                if input.get(*field).unwrap_or_default().encode_utf16().count() < *min {
                    return Err(ValidationError::TooShort);
                }
                Ok(())
            }
            Self::Digits(field) => check_digits(input.get(*field).unwrap_or_default(), *field),
        }
    }
}

/// The one numeric check every field goes through.
pub fn check_digits(value: &str, field: Field) -> Result<(), ValidationError> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::NotNumeric(field));
    }
    Ok(())
}

/// `None` stands for a parameter that is absent or was given more than once.
pub fn validate(
    postcode: Option<&str>,
    streetnumber: Option<&str>,
) -> Result<AddressQuery, ValidationError> {
    let input = Input {
        postcode,
        streetnumber,
    };
    for rule in RULES {
        rule.check(&input)?;
    }

    Ok(AddressQuery {
        postcode: postcode.unwrap_or_default().to_string(),
        streetnumber: streetnumber.unwrap_or_default().to_string(),
    })
}
