use proc_macro2::Ident;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Result, Token, Type};

/// A single `Generic = Type` substitution, e.g. `T = f64`.
pub struct Substitution {
    pub ident: Ident,
    pub ty: Type,
}

impl Parse for Substitution {
    fn parse(input: ParseStream) -> Result<Self> {
        let ident = input.parse()?;
        input.parse::<Token![=]>()?;
        let ty = input.parse()?;

        Ok(Substitution { ident, ty })
    }
}

/// Comma separated list of substitutions, one per generated impl block.
pub struct SubstitutionSequence(Punctuated<Substitution, Token![,]>);

impl SubstitutionSequence {
    pub fn iter(&self) -> impl Iterator<Item = &Substitution> {
        self.0.iter()
    }
}

impl Parse for SubstitutionSequence {
    fn parse(input: ParseStream) -> Result<Self> {
        Ok(SubstitutionSequence(Punctuated::parse_terminated(input)?))
    }
}
