// Aesthetics parser: channel → field assignments

use super::lexer::{identifier, word, ws};
use crate::mapping::{Channel, Mapping};
use nom::{
    bytes::complete::tag,
    character::complete::char,
    combinator::map_res,
    multi::separated_list0,
    sequence::separated_pair,
    IResult,
};

/// Parse aesthetics specification
/// Format: aes(x: col, y: col, color: col, size: col, opacity: col, shape: col)
/// Channels may appear in any order; quote field names containing spaces.
pub fn parse_aesthetics(input: &str) -> IResult<&str, Mapping> {
    let (input, _) = ws(tag("aes"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, pairs) = separated_list0(
        ws(char(',')),
        separated_pair(
            ws(map_res(identifier, |name| name.parse::<Channel>())),
            char(':'),
            ws(word),
        ),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut mapping = Mapping::default();
    for (channel, field) in pairs {
        mapping.set(channel, Some(field));
    }

    Ok((input, mapping))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aesthetics() {
        let (_, mapping) = parse_aesthetics("aes(x: time, y: temp)").unwrap();
        assert_eq!(mapping.x.as_deref(), Some("time"));
        assert_eq!(mapping.y.as_deref(), Some("temp"));
        assert_eq!(mapping.color, None);
    }

    #[test]
    fn test_parse_aesthetics_any_order_and_whitespace() {
        let (rest, mapping) = parse_aesthetics("  aes( color : region , y: temp, x: \"Unit Price\" )  ").unwrap();
        assert_eq!(rest, "");
        assert_eq!(mapping.x.as_deref(), Some("Unit Price"));
        assert_eq!(mapping.color.as_deref(), Some("region"));
    }

    #[test]
    fn test_parse_aesthetics_empty() {
        let (_, mapping) = parse_aesthetics("aes()").unwrap();
        assert_eq!(mapping, Mapping::default());
    }

    #[test]
    fn test_parse_aesthetics_unknown_channel() {
        assert!(parse_aesthetics("aes(z: depth)").is_err());
    }

    #[test]
    fn test_parse_aesthetics_missing_comma() {
        assert!(parse_aesthetics("aes(x: time y: temp)").is_err());
    }

    #[test]
    fn test_parse_aesthetics_unclosed_paren() {
        assert!(parse_aesthetics("aes(x: time, y: temp").is_err());
    }
}
