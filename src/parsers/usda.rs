use super::{
    primitive::{asset_path, path_target, quoted_string, typed_value},
    ws, Result, UsdaParseError,
};
use crate::path::{self, PrimPath};
use crate::value::{Value, ValueType};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{anychar, char, multispace1},
    combinator::{map, opt, recognize, verify},
    multi::{many0, separated_list, separated_nonempty_list},
    sequence::{delimited, pair, preceded, terminated, tuple},
    Err,
};
use std::result::Result as StdResult;

/// The raw structure of a parsed document, before it is realized into a `Stage`. The
/// split keeps the grammar free of any knowledge about how the runtime stores prims.
#[derive(Debug)]
pub struct Document {
    pub default_prim: Option<String>,
    pub doc: Option<String>,
    pub prims: Vec<PrimDef>,
}

#[derive(Debug)]
pub struct PrimDef {
    pub name: String,
    pub type_name: String,
    pub references: Vec<String>,
    pub properties: Vec<PropertyDef>,
    pub children: Vec<PrimDef>,
}

#[derive(Debug)]
pub enum PropertyDef {
    Attribute {
        name: String,
        value_type: ValueType,
        value: Option<Value>,
        custom: bool,
    },
    Relationship {
        name: String,
        targets: Vec<PrimPath>,
        custom: bool,
    },
}

/// Parses a whole `.usda` document.
pub fn parse_document(text: &str) -> StdResult<Document, UsdaParseError> {
    match document(text) {
        Ok((_, document)) => Ok(document),
        Err(Err::Failure(e)) | Err(Err::Error(e)) => Err(e),
        Err(Err::Incomplete(..)) => Err(UsdaParseError::NotEnoughData),
    }
}

fn document(input: &str) -> Result<Document> {
    let (input, _) = match tag::<_, _, UsdaParseError>("#usda 1.0")(input) {
        Ok(v) => v,
        Err(_) => return Err(Err::Failure(UsdaParseError::MissingHeader)),
    };

    let (input, _) = ws(input)?;
    let (input, metadata) = opt(layer_metadata)(input)?;
    let (input, prims) = many0(preceded(ws, prim))(input)?;
    let (input, _) = ws(input)?;

    if !input.is_empty() {
        return Err(Err::Failure(UsdaParseError::TrailingContent));
    }

    let (default_prim, doc) = metadata.unwrap_or((None, None));

    Ok((
        input,
        Document {
            default_prim,
            doc,
            prims,
        },
    ))
}

enum LayerEntry {
    DefaultPrim(String),
    Doc(String),
}

/// The parenthesized block after the header. Only the metadata the writer emits is
/// recognized.
fn layer_metadata(input: &str) -> Result<(Option<String>, Option<String>)> {
    let (input, _) = char('(')(input)?;
    let (input, entries) = many0(preceded(ws, layer_entry))(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char(')')(input)?;

    let mut default_prim = None;
    let mut doc = None;
    for entry in entries {
        match entry {
            LayerEntry::DefaultPrim(name) => default_prim = Some(name),
            LayerEntry::Doc(text) => doc = Some(text),
        }
    }

    Ok((input, (default_prim, doc)))
}

fn layer_entry(input: &str) -> Result<LayerEntry> {
    alt((
        map(|i| metadata_string(i, "defaultPrim"), LayerEntry::DefaultPrim),
        map(|i| metadata_string(i, "doc"), LayerEntry::Doc),
    ))(input)
}

fn metadata_string<'a>(input: &'a str, key: &'static str) -> Result<'a, String> {
    let (input, _) = tag(key)(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char('=')(input)?;
    let (input, _) = ws(input)?;
    quoted_string(input)
}

fn prim(input: &str) -> Result<PrimDef> {
    let (input, _) = terminated(tag("def"), multispace1)(input)?;
    let (input, type_name) = identifier(input)?;
    let (input, _) = multispace1(input)?;
    let (input, name) = quoted_string(input)?;

    // The grammar quotes prim names but they are identifiers all the same.
    if !path::is_identifier(&name) {
        return Err(Err::Failure(UsdaParseError::InvalidIdentifier(name)));
    }

    let (input, _) = ws(input)?;
    let (input, references) = opt(prim_metadata)(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char('{')(input)?;
    let (input, members) = many0(preceded(ws, member))(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char('}')(input)?;

    let mut properties = Vec::new();
    let mut children = Vec::new();
    for member in members {
        match member {
            Member::Property(property) => properties.push(property),
            Member::Child(child) => children.push(child),
        }
    }

    Ok((
        input,
        PrimDef {
            name,
            type_name: String::from(type_name),
            references: references.unwrap_or_default(),
            properties,
            children,
        },
    ))
}

enum Member {
    Property(PropertyDef),
    Child(PrimDef),
}

// `prim` has to be tried first: a property line would otherwise read `def` as a value
// type and fail the whole parse instead of backtracking.
fn member(input: &str) -> Result<Member> {
    alt((map(prim, Member::Child), map(property, Member::Property)))(input)
}

/// The parenthesized block between a prim's name and its body, holding the prim's
/// references.
fn prim_metadata(input: &str) -> Result<Vec<String>> {
    let (input, _) = char('(')(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = tag("references")(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char('=')(input)?;
    let (input, _) = ws(input)?;
    let (input, references) = alt((
        map(asset_path, |asset| vec![asset]),
        delimited(
            pair(char('['), ws),
            separated_list(tuple((ws, char(','), ws)), asset_path),
            pair(ws, char(']')),
        ),
    ))(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char(')')(input)?;

    Ok((input, references))
}

fn property(input: &str) -> Result<PropertyDef> {
    let (input, custom) = map(opt(terminated(tag("custom"), multispace1)), |c| {
        c.is_some()
    })(input)?;

    alt((
        move |i| relationship(i, custom),
        move |i| attribute(i, custom),
    ))(input)
}

fn relationship(input: &str, custom: bool) -> Result<PropertyDef> {
    let (input, _) = terminated(tag("rel"), multispace1)(input)?;
    let (input, name) = property_identifier(input)?;
    let (input, targets) = opt(preceded(
        tuple((ws, char('='), ws)),
        relationship_targets,
    ))(input)?;

    Ok((
        input,
        PropertyDef::Relationship {
            name: String::from(name),
            targets: targets.unwrap_or_default(),
            custom,
        },
    ))
}

fn relationship_targets(input: &str) -> Result<Vec<PrimPath>> {
    alt((
        map(path_target, |target| vec![target]),
        delimited(
            pair(char('['), ws),
            separated_list(tuple((ws, char(','), ws)), path_target),
            pair(ws, char(']')),
        ),
    ))(input)
}

fn attribute(input: &str, custom: bool) -> Result<PropertyDef> {
    let (input, type_token) = recognize(pair(identifier, opt(tag("[]"))))(input)?;

    let value_type = match ValueType::from_token(type_token) {
        Some(value_type) => value_type,
        None => {
            return Err(Err::Failure(UsdaParseError::UnknownValueType(
                String::from(type_token),
            )))
        }
    };

    let (input, _) = multispace1(input)?;
    let (input, name) = property_identifier(input)?;
    let (input, value) = opt(preceded(tuple((ws, char('='), ws)), move |i| {
        typed_value(i, value_type)
    }))(input)?;

    Ok((
        input,
        PropertyDef::Attribute {
            name: String::from(name),
            value_type,
            value,
            custom,
        },
    ))
}

fn identifier(input: &str) -> Result<&str> {
    recognize(pair(
        verify(anychar, |&c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn property_identifier(input: &str) -> Result<&str> {
    recognize(separated_nonempty_list(char(':'), identifier))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_document() {
        let document = parse_document("#usda 1.0\n").unwrap();
        assert!(document.prims.is_empty());
        assert!(document.default_prim.is_none());
    }

    #[test]
    fn reference_document() {
        let text = "\
#usda 1.0
(
    defaultPrim = \"reference\"
)

def Scope \"reference\"
{
    custom float test
}
";
        let document = parse_document(text).unwrap();
        assert_eq!(document.default_prim.as_deref(), Some("reference"));
        assert_eq!(document.prims.len(), 1);

        let prim = &document.prims[0];
        assert_eq!(prim.name, "reference");
        assert_eq!(prim.type_name, "Scope");
        match &prim.properties[..] {
            [PropertyDef::Attribute {
                name,
                value_type,
                value,
                custom,
            }] => {
                assert_eq!(name, "test");
                assert_eq!(*value_type, ValueType::Float);
                assert!(value.is_none());
                assert!(*custom);
            }
            _ => panic!("expected a single attribute"),
        }
    }

    #[test]
    fn nested_prims_with_references_and_relationships() {
        let text = "\
#usda 1.0

def Scope \"root_0\"
{
    custom int attr1
    custom int[] attr3

    def Scope \"child_0\" (
        references = @./reference.usd@
    )
    {
        custom rel rel1 = </root_0>
        custom int[] primvars:primvar0
    }
}
";
        let document = parse_document(text).unwrap();
        let root = &document.prims[0];
        assert_eq!(root.properties.len(), 2);
        assert_eq!(root.children.len(), 1);

        let child = &root.children[0];
        assert_eq!(child.references, vec![String::from("./reference.usd")]);
        match &child.properties[0] {
            PropertyDef::Relationship { name, targets, .. } => {
                assert_eq!(name, "rel1");
                assert_eq!(targets, &vec![PrimPath::new("/root_0")]);
            }
            _ => panic!("expected a relationship"),
        }
        match &child.properties[1] {
            PropertyDef::Attribute { name, value_type, .. } => {
                assert_eq!(name, "primvars:primvar0");
                assert_eq!(*value_type, ValueType::IntArray);
            }
            _ => panic!("expected an attribute"),
        }
    }

    #[test]
    fn authored_values_and_target_lists() {
        let text = "\
#usda 1.0

def Scope \"root\"
{
    custom int count = 12
    custom float[] weights = [0.5, 1]
    custom rel rel1 = [</a>, </b>]
    custom rel empty
}
";
        let document = parse_document(text).unwrap();
        let root = &document.prims[0];

        match &root.properties[0] {
            PropertyDef::Attribute { value, .. } => {
                assert_eq!(value.as_ref(), Some(&Value::Int(12)))
            }
            _ => panic!("expected an attribute"),
        }
        match &root.properties[1] {
            PropertyDef::Attribute { value, .. } => assert_eq!(
                value.as_ref(),
                Some(&Value::FloatArray(vec![0.5, 1.0]))
            ),
            _ => panic!("expected an attribute"),
        }
        match &root.properties[2] {
            PropertyDef::Relationship { targets, .. } => assert_eq!(targets.len(), 2),
            _ => panic!("expected a relationship"),
        }
        match &root.properties[3] {
            PropertyDef::Relationship { targets, .. } => assert!(targets.is_empty()),
            _ => panic!("expected a relationship"),
        }
    }

    #[test]
    fn missing_header_is_reported() {
        match parse_document("def Scope \"a\"\n{\n}\n") {
            Err(UsdaParseError::MissingHeader) => {}
            other => panic!("expected MissingHeader, got {:?}", other),
        }
    }

    #[test]
    fn unknown_value_types_are_reported() {
        let text = "#usda 1.0\n\ndef Scope \"a\"\n{\n    custom matrix4d m\n}\n";
        match parse_document(text) {
            Err(UsdaParseError::UnknownValueType(token)) => assert_eq!(token, "matrix4d"),
            other => panic!("expected UnknownValueType, got {:?}", other),
        }
    }

    #[test]
    fn prim_names_must_be_identifiers() {
        let text = "#usda 1.0\n\ndef Scope \"not a name\"\n{\n}\n";
        match parse_document(text) {
            Err(UsdaParseError::InvalidIdentifier(name)) => assert_eq!(name, "not a name"),
            other => panic!("expected InvalidIdentifier, got {:?}", other),
        }
    }

    #[test]
    fn trailing_content_is_reported() {
        match parse_document("#usda 1.0\n\ngarbage") {
            Err(UsdaParseError::TrailingContent) => {}
            other => panic!("expected TrailingContent, got {:?}", other),
        }
    }

    #[test]
    fn comments_are_skipped() {
        let text = "\
#usda 1.0
# a comment between prims

def Scope \"a\"
{
    # a comment inside a prim
    custom int attr1
}
";
        let document = parse_document(text).unwrap();
        assert_eq!(document.prims.len(), 1);
        assert_eq!(document.prims[0].properties.len(), 1);
    }
}
