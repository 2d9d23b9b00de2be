//! Macros that export the extension ABI symbols.

/// Exports `fd_ext_depends` and `fd_ext_init` for an extension.
///
/// The init function has the signature `fn(&InitArgs<'_>) -> c_int` and
/// returns 0 on success. Prerequisites are listed by name; they must be
/// configured before this extension.
///
/// # Example
/// ```rust,ignore
/// fn sample_init(args: &InitArgs<'_>) -> c_int {
///     0
/// }
///
/// extension_entry!("sample", sample_init);
/// extension_entry!("reporter", ["sample"], reporter_init);
/// ```
#[macro_export]
macro_rules! extension_entry {
    ($name:literal, $init:path) => {
        $crate::extension_entry!($name, [], $init);
    };
    ($name:literal, [$($dep:literal),* $(,)?], $init:path) => {
        #[allow(non_upper_case_globals)]
        #[unsafe(no_mangle)]
        pub static fd_ext_depends: $crate::__private::DependencyArray<
            { 2 + <[()]>::len(&[$($crate::__unit!($dep)),*]) },
        > = $crate::__private::DependencyArray::new([
            concat!($name, "\0").as_ptr().cast::<::std::os::raw::c_char>(),
            $(concat!($dep, "\0").as_ptr().cast::<::std::os::raw::c_char>(),)*
            ::std::ptr::null(),
        ]);

        /// Extension entry point.
        ///
        /// # Safety
        /// Called by the extension host with a valid argument block.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn fd_ext_init(
            major: ::std::os::raw::c_int,
            minor: ::std::os::raw::c_int,
            args: *mut $crate::__private::ExtensionArgs,
        ) -> ::std::os::raw::c_int {
            static INITIALIZED: $crate::__private::AtomicBool =
                $crate::__private::AtomicBool::new(false);
            // SAFETY: the host passes a valid argument block.
            unsafe {
                $crate::entry::guarded_init($name, &INITIALIZED, major, minor, args, $init)
            }
        }
    };
}

/// Exports `fd_ext_fini`, called once when the host terminates.
///
/// # Example
/// ```rust,ignore
/// fn sample_exit() {}
///
/// extension_exit!(sample_exit);
/// ```
#[macro_export]
macro_rules! extension_exit {
    ($fini:path) => {
        /// Extension exit hook.
        #[unsafe(no_mangle)]
        pub extern "C" fn fd_ext_fini() {
            $fini()
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __unit {
    ($t:tt) => {
        ()
    };
}
