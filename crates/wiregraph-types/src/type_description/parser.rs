//! Type grammar built from nom parser combinators
//!
//! Precedence, from loosest to tightest binding:
//!
//! 1. attributes and ownership specifiers (`@Sendable`, `inout`)
//! 2. protocol composition (`A & B`)
//! 3. `some` / `any`, which apply to a whole composition
//! 4. postfix operators (`?`, `!`, `.Type`, `.Protocol`)
//! 5. primaries: parenthesized tuples, groupings and closures, collection
//!    literals and dotted nominal paths with generic arguments

use nom::{
	IResult, Parser,
	branch::alt,
	bytes::complete::tag,
	character::complete::{alpha1, alphanumeric1, char, multispace0, multispace1, satisfy},
	combinator::{all_consuming, map, not, opt, recognize, value, verify},
	multi::{fold_many0, many0, many0_count, separated_list0, separated_list1},
	sequence::{delimited, pair, preceded, terminated},
};
use thiserror::Error;

use super::{TupleElement, TypeDescription};

/// Errors raised by the strict type parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TypeParseError {
	/// The text was empty or only whitespace.
	#[error("Type text is empty")]
	Empty,

	/// The text does not follow the type grammar.
	#[error("Invalid type `{text}`: unexpected input at offset {position}")]
	Invalid { text: String, position: usize },

	/// The text ended in the middle of a type.
	#[error("Incomplete type `{text}`")]
	Incomplete { text: String },
}

/// Parses `text` as a complete type.
pub(super) fn parse_type(text: &str) -> Result<TypeDescription, TypeParseError> {
	if text.trim().is_empty() {
		return Err(TypeParseError::Empty);
	}
	match all_consuming(ws(type_expr)).parse(text) {
		Ok((_, description)) => Ok(description),
		Err(nom::Err::Error(error) | nom::Err::Failure(error)) => Err(TypeParseError::Invalid {
			text: text.to_string(),
			position: text.len() - error.input.len(),
		}),
		Err(nom::Err::Incomplete(_)) => Err(TypeParseError::Incomplete {
			text: text.to_string(),
		}),
	}
}

// ============================================================================
// Lexical helpers
// ============================================================================

fn ws<'a, O, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
	F: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
	delimited(multispace0, inner, multispace0)
}

fn is_identifier_char(c: char) -> bool {
	c.is_alphanumeric() || c == '_'
}

/// Matches `word` only when it is not the prefix of a longer identifier.
fn keyword<'a>(
	word: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
	terminated(tag(word), not(satisfy(is_identifier_char)))
}

/// Parse a valid identifier (starts with letter or underscore, followed by alphanumeric or underscore)
fn identifier(input: &str) -> IResult<&str, &str> {
	recognize(pair(
		alt((alpha1, tag("_"))),
		many0_count(alt((alphanumeric1, tag("_")))),
	))
	.parse(input)
}

// ============================================================================
// Grammar
// ============================================================================

fn type_expr(input: &str) -> IResult<&str, TypeDescription> {
	map(
		(
			many0(terminated(attribute, multispace0)),
			opt(terminated(specifier, multispace1)),
			composition,
		),
		|(attributes, specifier, base)| {
			if attributes.is_empty() && specifier.is_none() {
				base
			} else {
				TypeDescription::Attributed {
					base: Box::new(base),
					specifier: specifier.map(str::to_string),
					attributes,
				}
			}
		},
	)
	.parse(input)
}

fn attribute(input: &str) -> IResult<&str, String> {
	map(preceded(char('@'), identifier), str::to_string).parse(input)
}

fn specifier(input: &str) -> IResult<&str, &str> {
	alt((
		tag("inout"),
		tag("borrowing"),
		tag("consuming"),
		tag("__owned"),
		tag("__shared"),
	))
	.parse(input)
}

fn composition(input: &str) -> IResult<&str, TypeDescription> {
	map(separated_list1(ws(char('&')), prefixed), |mut members| {
		if members.len() == 1 {
			members.remove(0)
		} else {
			TypeDescription::Composition(members.into())
		}
	})
	.parse(input)
}

fn prefixed(input: &str) -> IResult<&str, TypeDescription> {
	alt((
		map(
			preceded(terminated(tag("some"), multispace1), composition),
			|constraint| TypeDescription::Opaque(Box::new(constraint)),
		),
		map(
			preceded(terminated(tag("any"), multispace1), composition),
			|constraint| TypeDescription::Existential(Box::new(constraint)),
		),
		postfix,
	))
	.parse(input)
}

#[derive(Debug, Clone, Copy)]
enum Postfix {
	Optional,
	ImplicitlyUnwrapped,
	Type,
	Protocol,
}

fn postfix_operator(input: &str) -> IResult<&str, Postfix> {
	alt((
		value(Postfix::Optional, char('?')),
		value(Postfix::ImplicitlyUnwrapped, char('!')),
		value(Postfix::Type, pair(char('.'), keyword("Type"))),
		value(Postfix::Protocol, pair(char('.'), keyword("Protocol"))),
	))
	.parse(input)
}

fn postfix(input: &str) -> IResult<&str, TypeDescription> {
	let (input, base) = primary(input)?;
	fold_many0(
		postfix_operator,
		move || base.clone(),
		|wrapped, operator| match operator {
			Postfix::Optional => TypeDescription::Optional(Box::new(wrapped)),
			Postfix::ImplicitlyUnwrapped => {
				TypeDescription::ImplicitlyUnwrappedOptional(Box::new(wrapped))
			}
			Postfix::Type => TypeDescription::Metatype {
				base: Box::new(wrapped),
				is_type: true,
			},
			Postfix::Protocol => TypeDescription::Metatype {
				base: Box::new(wrapped),
				is_type: false,
			},
		},
	)
	.parse(input)
}

fn primary(input: &str) -> IResult<&str, TypeDescription> {
	alt((parenthesized, collection, nominal)).parse(input)
}

fn generic_arguments(input: &str) -> IResult<&str, Vec<TypeDescription>> {
	delimited(
		terminated(char('<'), multispace0),
		separated_list1(ws(char(',')), type_expr),
		preceded(multispace0, char('>')),
	)
	.parse(input)
}

fn nominal_segment(input: &str) -> IResult<&str, (&str, Vec<TypeDescription>)> {
	pair(
		identifier,
		map(opt(generic_arguments), Option::unwrap_or_default),
	)
	.parse(input)
}

/// Member segments stop before `.Type` and `.Protocol` so the postfix
/// operators can claim them.
fn member_segment(input: &str) -> IResult<&str, (&str, Vec<TypeDescription>)> {
	preceded(
		char('.'),
		pair(
			verify(identifier, |segment: &str| {
				!matches!(segment, "Type" | "Protocol")
			}),
			map(opt(generic_arguments), Option::unwrap_or_default),
		),
	)
	.parse(input)
}

fn nominal(input: &str) -> IResult<&str, TypeDescription> {
	let (input, (name, generics)) = nominal_segment(input)?;
	let head = TypeDescription::Simple {
		name: name.to_string(),
		generics,
	};
	fold_many0(
		member_segment,
		move || head.clone(),
		|parent, (name, generics)| TypeDescription::Nested {
			name: name.to_string(),
			parent: Box::new(parent),
			generics,
		},
	)
	.parse(input)
}

fn collection(input: &str) -> IResult<&str, TypeDescription> {
	map(
		delimited(
			terminated(char('['), multispace0),
			pair(type_expr, opt(preceded(ws(char(':')), type_expr))),
			preceded(multispace0, char(']')),
		),
		|(first, value)| match value {
			Some(value) => TypeDescription::Dictionary {
				key: Box::new(first),
				value: Box::new(value),
			},
			None => TypeDescription::Array(Box::new(first)),
		},
	)
	.parse(input)
}

fn tuple_element(input: &str) -> IResult<&str, TupleElement> {
	alt((
		map(
			(identifier, ws(char(':')), type_expr),
			|(label, _, type_description)| TupleElement::new(Some(label), type_description),
		),
		map(type_expr, |type_description| {
			TupleElement::new(None, type_description)
		}),
	))
	.parse(input)
}

fn closure_tail(input: &str) -> IResult<&str, (bool, bool, TypeDescription)> {
	(
		map(opt(preceded(multispace0, keyword("async"))), |word| {
			word.is_some()
		}),
		map(opt(preceded(multispace0, keyword("throws"))), |word| {
			word.is_some()
		}),
		preceded(ws(tag("->")), type_expr),
	)
		.parse(input)
}

/// A parenthesized element list is a closure when a signature tail follows,
/// a plain grouping when it holds one unlabeled element, and a tuple otherwise.
fn parenthesized(input: &str) -> IResult<&str, TypeDescription> {
	let (input, mut elements) = delimited(
		terminated(char('('), multispace0),
		separated_list0(ws(char(',')), tuple_element),
		preceded(multispace0, char(')')),
	)
	.parse(input)?;
	let (input, tail) = opt(closure_tail).parse(input)?;

	let description = match tail {
		Some((is_async, does_throw, return_type)) => TypeDescription::Closure {
			arguments: elements
				.into_iter()
				.map(|element| element.type_description)
				.collect(),
			is_async,
			does_throw,
			return_type: Box::new(return_type),
		},
		None if elements.len() == 1 && elements[0].label.is_none() => {
			elements.remove(0).type_description
		}
		None => TypeDescription::Tuple(elements),
	};
	Ok((input, description))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("Int", "Int")]
	#[case("  Int  ", "Int")]
	#[case("Array< Int >", "Array<Int>")]
	#[case("Dictionary<String,Int>", "Dictionary<String, Int>")]
	#[case("Outer.Inner<T>.Leaf", "Outer.Inner<T>.Leaf")]
	#[case("Thing?", "Thing?")]
	#[case("Thing!", "Thing!")]
	#[case("Thing??", "Thing??")]
	#[case("some View", "some View")]
	#[case("any Service", "any Service")]
	#[case("(any Service)?", "(any Service)?")]
	#[case("any A & B", "any A & B")]
	#[case("B&A", "A & B")]
	#[case("Thing.Type", "Thing.Type")]
	#[case("Service.Protocol", "Service.Protocol")]
	#[case("(any Service).Type", "(any Service).Type")]
	#[case("[Int]", "[Int]")]
	#[case("[ String : Int ]", "[String: Int]")]
	#[case("(name: String, Int)", "(name: String, Int)")]
	#[case("()", "()")]
	#[case("(Int)", "Int")]
	#[case("() -> Void", "() -> Void")]
	#[case("(Int, String) async throws -> Bool", "(Int, String) async throws -> Bool")]
	#[case("@escaping @Sendable () -> Void", "@escaping @Sendable () -> Void")]
	#[case("(() -> Void)?", "(() -> Void)?")]
	#[case("inout Int", "inout Int")]
	#[case("inoutThing", "inoutThing")]
	#[case("WireGraph.Instantiator<Thing>", "WireGraph.Instantiator<Thing>")]
	#[case("Foo.TypeAlias", "Foo.TypeAlias")]
	fn parses_to_canonical_source(#[case] text: &str, #[case] expected: &str) {
		// Act
		let parsed = parse_type(text);

		// Assert
		assert_eq!(parsed.map(|description| description.as_source()), Ok(expected.to_string()));
	}

	#[rstest]
	fn optional_binds_tighter_than_composition() {
		// Act
		let parsed = parse_type("A & B?").unwrap();

		// Assert
		let TypeDescription::Composition(members) = parsed else {
			panic!("expected a composition, got {parsed:?}");
		};
		assert!(members.iter().any(|member| matches!(member, TypeDescription::Optional(_))));
	}

	#[rstest]
	fn existential_covers_the_whole_composition() {
		// Act
		let parsed = parse_type("any A & B").unwrap();

		// Assert
		assert!(matches!(
			parsed,
			TypeDescription::Existential(ref inner) if matches!(**inner, TypeDescription::Composition(_))
		));
	}

	#[rstest]
	fn nested_type_keeps_parent_structure() {
		// Act
		let parsed = parse_type("Outer.Inner").unwrap();

		// Assert
		assert_eq!(
			parsed,
			TypeDescription::Nested {
				name: "Inner".to_string(),
				parent: Box::new(TypeDescription::simple("Outer")),
				generics: vec![],
			}
		);
	}

	#[rstest]
	#[case("")]
	#[case("   ")]
	fn empty_text_is_rejected(#[case] text: &str) {
		// Act
		let result = parse_type(text);

		// Assert
		assert_eq!(result, Err(TypeParseError::Empty));
	}

	#[rstest]
	#[case("Array<Int")]
	#[case("Int Int")]
	#[case("[Int")]
	#[case("A &")]
	#[case("^")]
	fn malformed_text_is_rejected(#[case] text: &str) {
		// Act
		let result = parse_type(text);

		// Assert
		assert!(
			matches!(result, Err(TypeParseError::Invalid { .. })),
			"expected invalid for {text:?}, got {result:?}"
		);
	}

	#[rstest]
	fn lenient_parse_keeps_unparseable_text() {
		// Act
		let description = TypeDescription::parse(" Int Int ");

		// Assert
		assert_eq!(description, TypeDescription::Unknown("Int Int".to_string()));
	}
}
