//! Sample Anchor source snippets for tests.

pub fn simple_program() -> &'static str {
    "export func main(): int return 0 end\n"
}

pub fn function_program() -> &'static str {
    "func add(a: int, b: int): int\n    return a + b\nend\n"
}

pub fn generic_function_program() -> &'static str {
    "func max[T](a: T, b: T): T\n    if a > b\n        return a\n    end\n    return b\nend\n"
}

pub fn struct_program() -> &'static str {
    "struct Point\n    x: int\n    y: int\n\n    func length(): int\n        return self.x + self.y\n    end\nend\n"
}

pub fn generic_struct_program() -> &'static str {
    "struct Node[T]\n    value: T\n    next: *Node[T]\nend\n"
}

pub fn interface_program() -> &'static str {
    "interface Shape\n    func area(): int\nend\n"
}

pub fn struct_satisfying_interface_program() -> &'static str {
    r#"interface Shape
    func area(): int
end

struct Square
    side: int

    func area(): int
        return self.side * self.side
    end
end

func describe(s: &Shape): int
    return s.area()
end
"#
}

pub fn enum_program() -> &'static str {
    "enum Color\n    Red\n    Green\n    Blue\nend\n"
}

/// A program with a type mismatch (`null` assigned to `int`), for
/// exercising diagnostic plumbing.
pub fn type_error_program() -> &'static str {
    "func main(): int\n    var x: int = null\n    return x\nend\n"
}

/// A program with a missing `end`, for exercising parser error recovery.
pub fn syntax_error_program() -> &'static str {
    "func main(): int\n    return 0\n"
}
