//! `#[derive(Record)]` for blobtree.
//!
//! Generates the `Record` and `Value` implementations for a struct with
//! named fields. The record layout is built on first use from each field's
//! name, its `#[blobtree("...")]` directive and its kind, then cached for
//! the life of the process.
//!
//! ```rust, ignore
//! #[derive(Default, Record)]
//! struct Photo {
//!     title: String,
//!     #[blobtree("w,omitempty")]
//!     width: u32,
//!     #[blobtree(",inline")]
//!     tags: Vec<String>,
//!     #[blobtree("-")]
//!     cached: bool,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DataStruct, DeriveInput, Fields, LitStr};

static ATTRIBUTE_NAME: &str = "blobtree";

/// Implement `blobtree::Record` and `blobtree::Value` for a struct with
/// named fields.
///
/// Each field may carry at most one `#[blobtree("...")]` directive: `"-"`
/// skips the field, otherwise `"name,opt,..."` renames it and sets any of
/// the `inline`, `external` and `omitempty` options. Every field type must
/// implement `blobtree::Value`.
#[proc_macro_derive(Record, attributes(blobtree))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[derive(Record)] does not support generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(named),
            ..
        }) => &named.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "#[derive(Record)] requires a struct with named fields",
            ))
        }
    };

    let ident = &input.ident;
    let record_name = ident.to_string();

    let mut decls = Vec::with_capacity(fields.len());
    let mut field_arms = Vec::with_capacity(fields.len());
    let mut field_mut_arms = Vec::with_capacity(fields.len());
    let mut members = Vec::with_capacity(fields.len());

    for (index, field) in fields.iter().enumerate() {
        let Some(member) = field.ident.as_ref() else {
            continue;
        };
        let declared = member.to_string();
        let declared = declared.strip_prefix("r#").unwrap_or(&declared).to_string();
        let directive = match directive(&field.attrs)? {
            Some(lit) => quote!(::std::option::Option::Some(#lit)),
            None => quote!(::std::option::Option::None),
        };

        decls.push(quote! {
            ::blobtree::FieldDecl::new(
                #declared,
                #directive,
                ::blobtree::Value::kind(&self.#member),
            )
        });
        field_arms.push(quote! {
            #index => ::std::option::Option::Some(&self.#member as &dyn ::blobtree::Value),
        });
        field_mut_arms.push(quote! {
            #index => ::std::option::Option::Some(&mut self.#member as &mut dyn ::blobtree::Value),
        });
        members.push(member);
    }

    Ok(quote! {
        impl ::blobtree::Record for #ident {
            fn layout(&self) -> &'static ::blobtree::RecordLayout {
                static LAYOUT: ::std::sync::OnceLock<::blobtree::RecordLayout> =
                    ::std::sync::OnceLock::new();
                LAYOUT.get_or_init(|| {
                    ::blobtree::RecordLayout::new(#record_name, ::std::vec![#(#decls),*])
                })
            }

            fn field(&self, index: usize) -> ::std::option::Option<&dyn ::blobtree::Value> {
                match index {
                    #(#field_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::std::option::Option<&mut dyn ::blobtree::Value> {
                match index {
                    #(#field_mut_arms)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl ::blobtree::Value for #ident {
            fn kind(&self) -> ::blobtree::Kind {
                ::blobtree::Kind::Record
            }

            fn view(&self) -> ::blobtree::View<'_> {
                ::blobtree::View::Record(self)
            }

            fn slot(&mut self) -> ::blobtree::Slot<'_> {
                ::blobtree::Slot::Record(self)
            }

            fn is_zero(&self) -> bool {
                true #(&& ::blobtree::Value::is_zero(&self.#members))*
            }

            fn type_name(&self) -> &'static str {
                #record_name
            }
        }
    })
}

/// The field's directive string, if it has one.
fn directive(attrs: &[Attribute]) -> syn::Result<Option<LitStr>> {
    let mut found: Option<LitStr> = None;
    for attr in attrs {
        if !attr.path().is_ident(ATTRIBUTE_NAME) {
            continue;
        }
        if found.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "duplicate #[blobtree] directive on one field",
            ));
        }
        found = Some(attr.parse_args::<LitStr>()?);
    }
    Ok(found)
}
