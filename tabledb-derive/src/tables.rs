use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse_quote, Data, DeriveInput, Error, Fields, Ident, Type};

use crate::type_utils::{table_element_type, FieldOptions};

/// A field recognised as a table.
struct TableField<'a> {
    ident: &'a Ident,
    name: String,
    element: &'a Type,
}

pub fn derive_tables(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    expand(&input).unwrap_or_else(Error::into_compile_error)
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let tables = collect_tables(input)?;

    let ident = &input.ident;
    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    let idents: Vec<&Ident> = tables.iter().map(|t| t.ident).collect();
    let elements: Vec<&Type> = tables.iter().map(|t| t.element).collect();

    // Every table must be usable through the erased interface; this carries
    // the serde and 'static requirements onto generic element types.
    let mut generics = input.generics.clone();
    if !generics.params.is_empty() {
        let where_clause = generics.make_where_clause();
        for element in &elements {
            where_clause
                .predicates
                .push(parse_quote!(#element: 'static));
            where_clause
                .predicates
                .push(parse_quote!(::tabledb::Table<#element>: ::tabledb::ErasedTable));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::tabledb::Tables for #ident #ty_generics #where_clause {
            fn descriptors() -> ::std::vec::Vec<::tabledb::TableDescriptor> {
                ::std::vec![
                    #(::tabledb::TableDescriptor::new::<#elements>(#names)),*
                ]
            }

            fn table(
                &self,
                name: &str,
            ) -> ::core::option::Option<&dyn ::tabledb::ErasedTable> {
                match name {
                    #(#names => ::core::option::Option::Some(
                        &self.#idents as &dyn ::tabledb::ErasedTable
                    ),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn table_mut(
                &mut self,
                name: &str,
            ) -> ::core::option::Option<&mut dyn ::tabledb::ErasedTable> {
                match name {
                    #(#names => ::core::option::Option::Some(
                        &mut self.#idents as &mut dyn ::tabledb::ErasedTable
                    ),)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

fn collect_tables(input: &DeriveInput) -> syn::Result<Vec<TableField<'_>>> {
    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            &input.ident,
            "Tables can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(Error::new_spanned(
            &data.fields,
            "Tables can only be derived for structs with named fields",
        ));
    };

    let mut tables: Vec<TableField<'_>> = Vec::new();
    for field in &named.named {
        let options = FieldOptions::from_attrs(&field.attrs)?;
        if options.skip {
            continue;
        }
        let Some(element) = table_element_type(&field.ty) else {
            continue;
        };
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };

        let name = options.rename.unwrap_or_else(|| ident.to_string());
        if tables.iter().any(|t| t.name == name) {
            return Err(Error::new_spanned(
                field,
                format!("duplicate table name `{name}`"),
            ));
        }
        tables.push(TableField {
            ident,
            name,
            element,
        });
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_str(input: DeriveInput) -> String {
        let tokens = expand(&input).unwrap();
        assert!(
            syn::parse2::<syn::ItemImpl>(tokens.clone()).is_ok(),
            "Generated code is not a valid impl:\n{tokens}"
        );
        tokens.to_string().replace(' ', "")
    }

    #[test]
    fn test_lists_table_fields_in_order() {
        let code = expand_str(parse_quote! {
            struct ScoreBoard {
                #[table(rename = "Scores")]
                scores: Table<i64>,
                people: tabledb::Table<Person>,
                title: String,
                history: Vec<i64>,
            }
        });

        assert!(code.contains("impl::tabledb::TablesforScoreBoard"));
        let scores = code
            .find("TableDescriptor::new::<i64>(\"Scores\")")
            .expect("missing Scores descriptor");
        let people = code
            .find("TableDescriptor::new::<Person>(\"people\")")
            .expect("missing people descriptor");
        assert!(scores < people);
        assert!(code.contains("\"Scores\"=>::core::option::Option::Some(&self.scores"));
        assert!(code.contains("&mutself.people"));
        assert!(!code.contains("title"));
        assert!(!code.contains("history"));
    }

    #[test]
    fn test_skip_and_malformed_tables_are_excluded() {
        let code = expand_str(parse_quote! {
            struct Host {
                #[table(skip)]
                scratch: Table<i64>,
                bare: Table,
                pair: Table<i64, i64>,
                kept: Table<String>,
            }
        });
        assert!(!code.contains("scratch"));
        assert!(!code.contains("bare"));
        assert!(!code.contains("pair"));
        assert!(code.contains("TableDescriptor::new::<String>(\"kept\")"));
    }

    #[test]
    fn test_host_without_tables() {
        let code = expand_str(parse_quote! {
            struct Empty {
                count: usize,
            }
        });
        assert!(code.contains("::std::vec![]"));
    }

    #[test]
    fn test_generics_are_forwarded() {
        let code = expand_str(parse_quote! {
            struct Generic<T: Clone> {
                items: Table<T>,
            }
        });
        assert!(code.contains("impl<T:Clone>::tabledb::TablesforGeneric<T>"));
        assert!(code.contains("whereT:'static,::tabledb::Table<T>:::tabledb::ErasedTable"));
    }

    #[test]
    fn test_existing_where_clause_is_extended() {
        let code = expand_str(parse_quote! {
            struct Bounded<T> where T: Clone {
                items: Table<T>,
                names: Table<String>,
            }
        });
        assert!(code.contains(
            "whereT:Clone,T:'static,::tabledb::Table<T>:::tabledb::ErasedTable,String:'static,::tabledb::Table<String>:::tabledb::ErasedTable"
        ));
    }

    #[test]
    fn test_concrete_hosts_get_no_where_clause() {
        let code = expand_str(parse_quote! {
            struct Plain {
                items: Table<i64>,
            }
        });
        assert!(!code.contains("where"));
    }

    #[test]
    fn test_rejects_enums_and_tuple_structs() {
        let input: DeriveInput = parse_quote! {
            enum NotAHost { A, B }
        };
        assert!(expand(&input).is_err());

        let input: DeriveInput = parse_quote! {
            struct Tuple(Table<i64>);
        };
        assert!(expand(&input).is_err());
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let input: DeriveInput = parse_quote! {
            struct Clash {
                #[table(rename = "b")]
                a: Table<i64>,
                b: Table<i64>,
            }
        };
        let err = expand(&input).err().expect("duplicate accepted");
        assert!(err.to_string().contains("duplicate table name `b`"));
    }
}
