use heck::ToSnakeCase;
use proc_macro::TokenStream;
use quote::{format_ident, quote, ToTokens};
use syn::{
    parse::{Parse, ParseStream, Result},
    punctuated::Punctuated,
    Field, Ident, Token,
};

/// Input: `Name, [ Node => { field: Type, ... }; ... ]`.
struct Family {
    name: Ident,
    nodes: Punctuated<Node, Token![;]>,
}

impl Parse for Family {
    fn parse(input: ParseStream) -> Result<Self> {
        let name = input.parse()?;
        input.parse::<Token![,]>()?;
        let body;
        syn::bracketed!(body in input);
        Ok(Family { name, nodes: body.parse_terminated(Node::parse, Token![;])? })
    }
}

struct Node {
    name: Ident,
    fields: Punctuated<Field, Token![,]>,
}

impl Parse for Node {
    fn parse(input: ParseStream) -> Result<Self> {
        let name = input.parse()?;
        input.parse::<Token![=>]>()?;
        let body;
        syn::braced!(body in input);
        Ok(Node { name, fields: body.parse_terminated(Field::parse_named, Token![,])? })
    }
}

impl Node {
    fn snake_name(&self) -> String {
        self.name.to_string().to_snake_case()
    }

    fn visit_fn(&self, family: &Ident) -> Ident {
        format_ident!("visit_{}_{}", self.snake_name(), family.to_string().to_lowercase())
    }

    fn field_names(&self) -> impl Iterator<Item = &Ident> {
        self.fields.iter().filter_map(|f| f.ident.as_ref())
    }

    /// `pub struct Node { pub(crate) field: Type, ... }`
    fn definition(&self) -> impl ToTokens {
        let name = &self.name;
        let fields = self.field_names().zip(self.fields.iter().map(|f| &f.ty));
        let fields = fields.map(|(field, ty)| quote!(pub(crate) #field: #ty));
        quote! {
            #[derive(Debug, PartialEq)]
            pub struct #name { #(#fields),* }
        }
    }

    /// `fn new_node(field: Type, ...) -> Family`, arguments in declaration order.
    fn constructor(&self, family: &Ident) -> impl ToTokens {
        let name = &self.name;
        let constructor = format_ident!("new_{}", self.snake_name());
        let params = self.fields.iter().map(|f| {
            let (field, ty) = (&f.ident, &f.ty);
            quote!(#field: #ty)
        });
        let fields: Vec<_> = self.field_names().collect();
        quote! {
            #[allow(dead_code)]
            pub(crate) fn #constructor(#(#params),*) -> Self {
                #family::#name(#name { #(#fields),* })
            }
        }
    }
}

/// Expands a closed AST family into an enum with one variant per node, the
/// node structs, `new_<node>` constructors, a `Visitor<T>` trait with one
/// `visit_<node>_<family>` method per node, and `accept` to dispatch to it.
#[proc_macro]
pub fn generate_ast(input: TokenStream) -> TokenStream {
    let Family { name, nodes } = syn::parse_macro_input!(input);

    let variants: Vec<_> = nodes.iter().map(|n| &n.name).collect();
    let visit_fns: Vec<_> = nodes.iter().map(|n| n.visit_fn(&name)).collect();
    let definitions = nodes.iter().map(Node::definition);
    let constructors = nodes.iter().map(|n| n.constructor(&name));

    quote! {
        #[derive(Debug, PartialEq)]
        pub enum #name {
            #(#variants(#variants)),*
        }

        #(#definitions)*

        pub(crate) trait Visitor<T> {
            #(fn #visit_fns(&mut self, node: &#variants) -> T;)*
        }

        impl #name {
            #(#constructors)*

            pub(crate) fn accept<T, V: Visitor<T>>(&self, visitor: &mut V) -> T {
                match self {
                    #(#name::#variants(node) => visitor.#visit_fns(node),)*
                }
            }
        }
    }
    .into()
}
