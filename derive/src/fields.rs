use darling::ast::Data;
use darling::util::Ignored;
use darling::{FromDeriveInput, FromField};
use proc_macro2::TokenStream;
use quote::quote;

#[derive(FromDeriveInput)]
#[darling(attributes(gridformat), supports(struct_named))]
struct Input {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<Ignored, Member>,
}

#[derive(FromField)]
#[darling(attributes(gridformat))]
struct Member {
    ident: Option<syn::Ident>,
    #[darling(default)]
    rename: Option<String>,
    #[darling(default)]
    skip: bool,
    #[darling(default)]
    cell: bool,
}

pub(crate) fn derive(input: syn::DeriveInput) -> darling::Result<TokenStream> {
    let input = Input::from_derive_input(&input)?;
    let members = input
        .data
        .take_struct()
        .ok_or_else(|| darling::Error::unsupported_shape("enum"))?;

    let mut body = quote! {};

    for member in members.fields.into_iter().filter(|m| !m.skip) {
        // supports(struct_named) guarantees an identifier
        let ident = match member.ident {
            Some(ident) => ident,
            None => continue,
        };
        let name = member.rename.unwrap_or_else(|| ident.to_string());
        let lit = syn::LitStr::new(&name, proc_macro2::Span::call_site());

        body = if member.cell {
            quote! {
                #body
                writer.set_cell_values(#lit, &self.#ident[..])?;
            }
        } else {
            quote! {
                #body
                writer.set_point_values(#lit, &self.#ident[..])?;
            }
        };
    }

    let struct_type = input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // declare the whole trait
    Ok(quote! {
        impl #impl_generics gridformat::Fields for #struct_type #ty_generics #where_clause {
            fn register<'gridformat, G, F>(
                &'gridformat self,
                writer: &mut gridformat::Writer<'gridformat, G, F>,
            ) -> ::std::result::Result<(), gridformat::Error>
            where
                G: gridformat::Grid,
            {
                #body

                Ok(())
            }
        }
    })
}
