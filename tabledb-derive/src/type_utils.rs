use syn::{Attribute, GenericArgument, LitStr, PathArguments, Type};

/// If `ty` is spelled `Table<E>` (any path prefix), return `E`.
/// Anything else, including a bare `Table` or `Table<A, B>`, yields None.
pub fn table_element_type(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }

    let segment = type_path.path.segments.last()?;
    if segment.ident != "Table" {
        return None;
    }

    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let mut types = args.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    });
    match (types.next(), types.next(), args.args.len()) {
        (Some(element), None, 1) => Some(element),
        _ => None,
    }
}

/// Options from `#[table(...)]` on a field.
#[derive(Debug, Default)]
pub struct FieldOptions {
    pub rename: Option<String>,
    pub skip: bool,
}

impl FieldOptions {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut options = FieldOptions::default();
        for attr in attrs {
            if !attr.path().is_ident("table") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    options.skip = true;
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    let name: LitStr = meta.value()?.parse()?;
                    if name.value().is_empty() {
                        return Err(meta.error("table name cannot be empty"));
                    }
                    options.rename = Some(name.value());
                    Ok(())
                } else {
                    Err(meta.error("expected `rename = \"...\"` or `skip`"))
                }
            })?;
        }
        Ok(options)
    }
}
