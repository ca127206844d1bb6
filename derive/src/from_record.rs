use std::collections::HashMap;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Error, ExprClosure, Field, Fields, GenericArgument, Ident,
    LitInt, Pat, PathArguments, Result, Token, Type,
    parse::{Parse, ParseStream},
    spanned::Spanned,
};

pub(crate) fn expand_from_record(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new(
            input.span(),
            "`FromRecord` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new(
            input.span(),
            "`FromRecord` may only be derived on structs with named fields.",
        ))?
    };

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .map(Result::transpose)
        .flatten() // Skip fields without an attribute.
        .collect::<Result<Vec<_>>>()?;

    let mut numbers: HashMap<u8, LitInt> = HashMap::new();
    let mut field_cases = Vec::new();
    let mut time_case = None;

    for field in &fields {
        match &field.identifier {
            FieldIdentifier::Number(number) => {
                let value = number.base10_parse::<u8>()?;

                if numbers.insert(value, number.clone()).is_some() {
                    Err(Error::new(number.span(), "Field identifiers must be unique."))?
                }

                let target = &field.target;
                let assignment = field.assignment(quote! { value });

                field_cases.push(quote! {
                    #number => {
                        if let Ok(value) = <#target as ::core::convert::TryFrom<
                            &::freewheel::sans::value::FieldValue,
                        >>::try_from(value) {
                            #assignment;
                        }
                    }
                });
            }
            FieldIdentifier::Time => {
                let assignment = field.assignment(quote! {
                    ::core::convert::From::from(timestamp)
                });

                if time_case.replace(assignment).is_some() {
                    Err(Error::new_spanned(
                        &field.attribute,
                        "Field identifiers must be unique.",
                    ))?
                }
            }
        }
    }

    let field_method = (!field_cases.is_empty()).then(|| {
        quote! {
            fn add_field(&mut self, field: u8, value: &::freewheel::sans::value::FieldValue) {
                match field {
                    #(#field_cases)*
                    _ => {}
                };
            }
        }
    });

    let time_method = time_case.map(|assignment| {
        quote! {
            fn add_timestamp(&mut self, timestamp: u32) {
                #assignment;
            }
        }
    });

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::freewheel::avec::FromRecord for #name #ty_generics #where_clause {
            #field_method
            #time_method
        }
    };

    Ok(expanded.into())
}

struct FieldMetadata {
    name: Ident,
    /// The type values are converted to before assignment.
    target: Type,
    identifier: FieldIdentifier,
    handler: Option<(Type, ExprClosure)>,
    attribute: Attribute,
}

enum FieldIdentifier {
    Number(LitInt),
    Time,
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Option<Self>> {
        let Some(name) = field.ident.clone() else {
            return Ok(None);
        };

        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("field")) else {
            return Ok(None);
        };

        let FieldAttribute {
            identifier,
            handler,
        } = attr.meta.require_list()?.parse_args()?;

        let target = if let Some(handler) = &handler {
            if handler.inputs.len() != 2 {
                Err(Error::new_spanned(
                    handler,
                    "Handler closure must have two parameters.",
                ))?
            }

            let parameter = &handler.inputs[1];

            let Pat::Type(pat_type) = parameter else {
                Err(Error::new_spanned(
                    parameter,
                    "Handler closure's second parameter must be annotated with the expected value type.",
                ))?
            };

            (*pat_type.ty).clone()
        } else {
            option_inner(&field.ty)?
        };

        let handler = handler.map(|h| (field.ty.clone(), h));

        Ok(Some(Self {
            name,
            target,
            identifier,
            handler,
            attribute: attr.clone(),
        }))
    }

    /// Store a converted value, directly or through the handler closure.
    fn assignment(&self, value: TokenStream2) -> TokenStream2 {
        let name = &self.name;

        if let Some((field_type, handler)) = &self.handler {
            let body = &handler.body;
            let acc = &handler.inputs[0];
            let val = &handler.inputs[1];

            quote! {
                (|#acc: &mut #field_type, #val| { #body })(&mut self.#name, #value)
            }
        } else {
            quote! { self.#name = ::core::option::Option::Some(#value) }
        }
    }
}

/// Extract `T` from a field of type `Option<T>`.
fn option_inner(ty: &Type) -> Result<Type> {
    let Type::Path(path) = ty else {
        Err(Error::new_spanned(ty, "Field must have a type annotation."))?
    };

    let Some(segment) = path.path.segments.last() else {
        Err(Error::new_spanned(
            &path.path.segments,
            "Field must have a type annotation.",
        ))?
    };

    if segment.ident != "Option" {
        Err(Error::new_spanned(
            &segment.ident,
            "Field without a handler must have type `Option<T>`.",
        ))?
    }

    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        Err(Error::new_spanned(
            &segment.arguments,
            "Field of type `Option<T>` must have a generic parameter.",
        ))?
    };

    let Some(GenericArgument::Type(inner_type)) = arguments.args.first() else {
        Err(Error::new_spanned(
            &arguments.args,
            "Generic argument of a field of type `Option<T>` must be a type.",
        ))?
    };

    Ok(inner_type.clone())
}

struct FieldAttribute {
    identifier: FieldIdentifier,
    handler: Option<ExprClosure>,
}

impl Parse for FieldAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        let identifier = if input.peek(Ident) {
            let ident = input.parse::<Ident>()?;
            if ident != "time" {
                Err(Error::new_spanned(
                    ident,
                    "Field identifier must be an integer literal or `time`.",
                ))?
            }
            FieldIdentifier::Time
        } else {
            FieldIdentifier::Number(input.parse::<LitInt>()?)
        };

        let handler = if !input.is_empty() {
            input.parse::<Token![,]>()?;
            Some(input.parse::<ExprClosure>()?)
        } else {
            None
        };

        Ok(Self {
            identifier,
            handler,
        })
    }
}
