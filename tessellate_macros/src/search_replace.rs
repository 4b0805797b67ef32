use proc_macro2::Ident;
use std::iter::FromIterator;
use syn::punctuated::Punctuated;
use syn::visit_mut::{self, VisitMut};
use syn::{GenericParam, Generics, Type};

/// Removes the generic type parameter `find` from the visited generics.
pub struct RemoveGenerics {
    pub find: Ident,
}

/// Replaces every occurrence of the type `find` by `replace`.
pub struct FindReplaceType {
    pub find: Ident,
    pub replace: Type,
}

impl VisitMut for RemoveGenerics {
    fn visit_generics_mut(&mut self, node: &mut Generics) {
        node.params = Punctuated::from_iter(
            node.params
                .iter()
                .filter(|x| {
                    if let GenericParam::Type(type_param) = &x {
                        return type_param.ident != self.find;
                    }

                    true
                })
                .cloned(),
        );

        if node.params.is_empty() {
            node.lt_token = None;
            node.gt_token = None;
        }

        visit_mut::visit_generics_mut(self, node);
    }
}

impl VisitMut for FindReplaceType {
    fn visit_type_mut(&mut self, node: &mut Type) {
        if let Type::Path(type_path) = &node {
            if type_path.qself.is_none() && type_path.path.is_ident(&self.find) {
                *node = self.replace.clone();
                return;
            }
        }

        visit_mut::visit_type_mut(self, node);
    }
}
