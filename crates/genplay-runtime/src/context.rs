//! Isolated load contexts.
//!
//! A [`LoadContext`] is one generation: the loaded module, the reference
//! libraries it runs against and every piece of static state its code
//! creates. Nothing outside the generation points back into it, so dropping
//! the last `Rc` releases all of it at once and the next generation starts
//! from scratch.

use crate::error::LoadError;
use crate::value::{ClassId, Value};
use genplay_compiler::ir::{MethodDef, ModuleImage, TypeDef, TypeRef};
use genplay_compiler::ReferenceSet;
use genplay_core::LibraryIdentity;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Static field storage of one class.
#[derive(Debug, Default)]
pub(crate) struct ClassStatics {
    pub values: HashMap<String, Value>,
}

/// One isolated generation of loaded code.
#[derive(Debug)]
pub struct LoadContext {
    generation: u64,
    modules: Vec<Arc<ModuleImage>>,
    libraries: HashMap<LibraryIdentity, u32>,
    main: u32,
    statics: RefCell<HashMap<ClassId, ClassStatics>>,
}

impl LoadContext {
    /// Decode `bytes` and load the module into a fresh generation.
    pub fn load_bytes(bytes: &[u8], references: &ReferenceSet) -> Result<Rc<Self>, LoadError> {
        let image = ModuleImage::decode(bytes)?;
        Self::load(Arc::new(image), references)
    }

    /// Load a decoded module into a fresh generation.
    ///
    /// Every library the module was compiled against must be in
    /// `references`.
    pub fn load(image: Arc<ModuleImage>, references: &ReferenceSet) -> Result<Rc<Self>, LoadError> {
        for library in &image.references {
            if !references.contains(library) {
                return Err(LoadError::MissingLibrary {
                    module: image.name.clone(),
                    library: library.clone(),
                });
            }
        }

        let mut modules: Vec<Arc<ModuleImage>> = references.libraries().to_vec();
        let libraries = modules
            .iter()
            .enumerate()
            .map(|(i, m)| (LibraryIdentity::new(m.name.clone()), i as u32))
            .collect();
        let main = modules.len() as u32;
        modules.push(image);

        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        debug!(generation, module = %modules[main as usize].name, "created load context");
        Ok(Rc::new(Self {
            generation,
            modules,
            libraries,
            main,
            statics: RefCell::new(HashMap::new()),
        }))
    }

    /// Unique generation number.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The loaded (non-library) module.
    pub fn main_module(&self) -> &ModuleImage {
        &self.modules[self.main as usize]
    }

    /// Index of the loaded module.
    pub const fn main_index(&self) -> u32 {
        self.main
    }

    /// Module at `index`.
    pub fn module(&self, index: u32) -> &ModuleImage {
        &self.modules[index as usize]
    }

    /// Type definition of a class.
    pub fn class(&self, id: ClassId) -> &TypeDef {
        &self.modules[id.module as usize].types[id.index as usize]
    }

    /// Classes declared by the loaded module, in declaration order.
    pub fn classes(&self) -> impl Iterator<Item = ClassId> + '_ {
        let module = self.main;
        (0..self.main_module().types.len()).map(move |index| ClassId {
            module,
            index: index as u32,
        })
    }

    /// Find a class of the loaded module by simple name.
    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.find_in(self.main, name)
    }

    fn find_in(&self, module: u32, name: &str) -> Option<ClassId> {
        self.modules[module as usize]
            .types
            .iter()
            .position(|t| t.name == name)
            .map(|index| ClassId {
                module,
                index: index as u32,
            })
    }

    /// Find a class of a library by simple name.
    pub fn find_library_class(&self, library: &str, name: &str) -> Option<ClassId> {
        let module = *self.libraries.get(&LibraryIdentity::new(library))?;
        self.find_in(module, name)
    }

    /// Resolve a type reference written in `from_module`.
    pub fn resolve(&self, from_module: u32, ty: &TypeRef) -> Option<ClassId> {
        let module = match &ty.library {
            Some(library) => *self.libraries.get(library)?,
            None => from_module,
        };
        self.find_in(module, &ty.name)
    }

    /// The base class of `id`, if any.
    pub fn base_of(&self, id: ClassId) -> Option<ClassId> {
        let base = self.class(id).base.as_ref()?;
        self.resolve(id.module, base)
    }

    /// `id` followed by its base classes.
    pub fn ancestors(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(id);
        while let Some(class) = current {
            if !seen.insert(class) {
                break;
            }
            chain.push(class);
            current = self.base_of(class);
        }
        chain
    }

    /// Whether `id` is `target` or derives from it.
    pub fn is_subclass_of(&self, id: ClassId, target: ClassId) -> bool {
        self.ancestors(id).contains(&target)
    }

    /// Whether `id` implements `capability`, directly or through bases and
    /// capability inheritance.
    pub fn implements(&self, id: ClassId, capability: ClassId) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![id];
        while let Some(class) = stack.pop() {
            if class == capability {
                return true;
            }
            if !seen.insert(class) {
                continue;
            }
            let def = self.class(class);
            stack.extend(def.base.iter().filter_map(|b| self.resolve(class.module, b)));
            stack.extend(
                def.capabilities
                    .iter()
                    .filter_map(|c| self.resolve(class.module, c)),
            );
        }
        false
    }

    /// Find a method on `id` or its bases, with the declaring class.
    pub fn find_method(&self, id: ClassId, name: &str) -> Option<(ClassId, &MethodDef)> {
        self.ancestors(id)
            .into_iter()
            .find_map(|class| self.class(class).find_method(name).map(|m| (class, m)))
    }

    pub(crate) fn statics(&self) -> &RefCell<HashMap<ClassId, ClassStatics>> {
        &self.statics
    }
}
