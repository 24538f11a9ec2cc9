use std::collections::HashMap;

pub type Scope<T> = HashMap<String, T>;

/// One activation: the parameter frame plus the block scopes opened inside
/// it, innermost last. Used with types during analysis and values during
/// execution.
#[derive(Debug)]
pub struct CallContext<T> {
    parameters: Scope<T>,
    scopes: Vec<Scope<T>>,
}

impl<T> CallContext<T> {
    pub fn new(parameters: Scope<T>) -> Self {
        Self {
            parameters,
            scopes: vec![Scope::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.parameters.get(name))
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Binds `name` in the innermost scope.
    pub fn declare(&mut self, name: &str, value: T) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    /// Overwrites the nearest existing binding of `name`. Returns false when
    /// there is none; no new binding is created.
    pub fn assign(&mut self, name: &str, value: T) -> bool {
        let slot = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
            .or_else(|| self.parameters.get_mut(name));
        match slot {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// The global context for top-level statements plus one context per active
/// function call.
#[derive(Debug)]
pub struct CallStack<T> {
    global: CallContext<T>,
    calls: Vec<CallContext<T>>,
}

impl<T> Default for CallStack<T> {
    fn default() -> Self {
        Self {
            global: CallContext::new(Scope::new()),
            calls: Vec::new(),
        }
    }
}

impl<T> CallStack<T> {
    pub fn enter_call(&mut self, parameters: Scope<T>) {
        self.calls.push(CallContext::new(parameters));
    }

    pub fn exit_call(&mut self) {
        self.calls.pop();
    }

    pub fn current(&self) -> &CallContext<T> {
        self.calls.last().unwrap_or(&self.global)
    }

    pub fn current_mut(&mut self) -> &mut CallContext<T> {
        self.calls.last_mut().unwrap_or(&mut self.global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_innermost_to_outermost_then_parameters() {
        let mut params = Scope::new();
        params.insert("p".to_string(), 1);
        let mut context = CallContext::new(params);
        context.declare("x", 2);
        context.push_scope();
        context.declare("x", 3);

        assert_eq!(context.lookup("x"), Some(&3));
        assert_eq!(context.lookup("p"), Some(&1));
        context.pop_scope();
        assert_eq!(context.lookup("x"), Some(&2));
        assert_eq!(context.lookup("missing"), None);
    }

    #[test]
    fn assign_touches_only_the_nearest_binding() {
        let mut context = CallContext::new(Scope::new());
        context.declare("x", 1);
        context.push_scope();
        context.declare("x", 10);
        context.push_scope();

        assert!(context.assign("x", 20));
        assert_eq!(context.lookup("x"), Some(&20));
        context.pop_scope();
        context.pop_scope();
        assert_eq!(context.lookup("x"), Some(&1));
        assert!(!context.assign("y", 5));
        assert!(!context.is_declared("y"));
    }

    #[test]
    fn calls_get_a_fresh_context() {
        let mut stack: CallStack<i32> = CallStack::default();
        stack.current_mut().declare("global", 1);
        stack.enter_call(Scope::new());
        assert!(!stack.current().is_declared("global"));
        stack.current_mut().declare("local", 2);
        assert!(stack.current().is_declared("local"));
        stack.exit_call();
        assert!(stack.current().is_declared("global"));
        assert!(!stack.current().is_declared("local"));
    }
}
