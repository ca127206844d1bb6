use std::collections::HashMap;

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Field, Fields, Ident, LitInt, Result, Type,
    parse::{Parse, ParseStream},
};

pub(crate) fn expand_from_records(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new_spanned(
            input,
            "`FromRecords` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new_spanned(
            input,
            "`FromRecords` may only be derived on structs with named fields.",
        ))?
    };

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .map(Result::transpose)
        .flatten() // Skip fields without an attribute.
        .collect::<Result<Vec<_>>>()?;

    let mut numbers = HashMap::new();

    for field in &fields {
        let value = field.number.base10_parse::<u16>()?;

        if numbers.insert(value, ()).is_some() {
            Err(Error::new(
                field.number.span(),
                "Record identifiers must be unique.",
            ))?
        }
    }

    let cases = fields.iter().map(|field| {
        let FieldMetadata {
            name,
            number,
            collection,
        } = field;

        let assignment = match collection {
            Collection::Vec => quote! {
                let mut r = ::core::default::Default::default();
                ::freewheel::avec::publish(record, &mut r);
                self.#name.push(r);
            },
            Collection::Option => quote! {
                let r = self.#name.insert(::core::default::Default::default());
                ::freewheel::avec::publish(record, r);
            },
        };

        quote! { #number => { #assignment } }
    });

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::freewheel::avec::FromRecords for #name #ty_generics #where_clause {
            fn add_record(&mut self, record: &::freewheel::sans::data::DecodedRecord) {
                match record.global {
                    #(#cases)*
                    _ => {}
                }
            }
        }
    };

    Ok(expanded.into())
}

struct FieldMetadata {
    name: Ident,
    number: LitInt,
    collection: Collection,
}

enum Collection {
    Option,
    Vec,
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Option<Self>> {
        let Some(name) = field.ident.clone() else {
            return Ok(None);
        };

        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("record")) else {
            return Ok(None);
        };

        let RecordAttribute { number } = attr.meta.require_list()?.parse_args()?;

        let Type::Path(path) = &field.ty else {
            Err(Error::new_spanned(
                &field.ty,
                "Field must have a type annotation.",
            ))?
        };

        let Some(segment) = path.path.segments.last() else {
            Err(Error::new_spanned(
                &path.path.segments,
                "Field must have an `Option<T>` or `Vec<T>` type.",
            ))?
        };

        let collection = if segment.ident == "Option" {
            Collection::Option
        } else if segment.ident == "Vec" {
            Collection::Vec
        } else {
            Err(Error::new_spanned(
                &segment.ident,
                "Field must have an `Option<T>` or `Vec<T>` type.",
            ))?
        };

        Ok(Some(Self {
            name,
            number,
            collection,
        }))
    }
}

struct RecordAttribute {
    number: LitInt,
}

impl Parse for RecordAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        let number = input.parse::<LitInt>()?;
        Ok(Self { number })
    }
}
