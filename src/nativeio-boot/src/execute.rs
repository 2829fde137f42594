//! The subcommands, driven through the same C entry points foreign code
//! uses.
use crate::cli::Command;
use anyhow::{bail, Context, Result};
use nativeio::abi::*;
use nativeio::NATIVEIO_ERROR;
use std::ffi::CString;
use std::io::Write;
use typemap::{sc_free_name_list, sc_read_name_list, sc_split_i64, LibcAllocator, NameList};

const CHUNK: usize = 64 * 1024;

pub fn execute(command: &Command) -> Result<()> {
    match command {
        Command::Demo { name } => demo(name),
        Command::Ls => {
            for name in list()? {
                println!("{}", name);
            }
            Ok(())
        }
        Command::Cat { name } => cat(name),
        Command::Rm { name } => remove(name),
    }
}

fn check(op: &str, ret: i32) -> Result<i32> {
    if ret == NATIVEIO_ERROR {
        bail!("{} failed (run with -v for the cause)", op);
    }
    Ok(ret)
}

fn c_name(name: &str) -> Result<CString> {
    CString::new(name).with_context(|| format!("file name {:?} contains a NUL byte", name))
}

// Opens `name`, runs `f` and closes the descriptor whatever `f` returned.
fn with_open<T>(name: &str, f: impl FnOnce(i32) -> Result<T>) -> Result<T> {
    let cname = c_name(name)?;
    let fd = check("open", unsafe { NativeIO_Open(cname.as_ptr()) })
        .with_context(|| format!("opening {:?}", name))?;
    log::info!("opened {:?} as fd {}", name, fd);
    let result = f(fd);
    let closed = check("close", NativeIO_Close(fd));
    let value = result?;
    closed?;
    Ok(value)
}

fn write_at(fd: i32, data: &[u8], offset: i64) -> Result<usize> {
    let (low, high) = sc_split_i64(offset);
    let len = i32::try_from(data.len())?;
    let written = check("write", unsafe { NativeIO_Write(fd, data.as_ptr(), len, low, high) })?;
    Ok(usize::try_from(written)?)
}

fn read_at(fd: i32, buf: &mut [u8], offset: i64) -> Result<usize> {
    let (low, high) = sc_split_i64(offset);
    let len = i32::try_from(buf.len())?;
    let read = check("read", unsafe { NativeIO_Read(fd, buf.as_mut_ptr(), len, low, high) })?;
    Ok(usize::try_from(read)?)
}

fn list() -> Result<Vec<String>> {
    let mut count = 0;
    let array = unsafe { NativeIO_GetAll(&mut count) };
    if array.is_null() {
        bail!("getall failed (run with -v for the cause)");
    }
    // non-negative whenever the array is non-null
    let list = NameList {
        ptrs: array,
        count: count.unsigned_abs() as usize,
    };
    // SAFETY: GetAll handed us `count` malloc'ed strings in a malloc'ed
    // array, all of which are ours to free.
    let names = unsafe { sc_read_name_list(&list) };
    unsafe { sc_free_name_list(list, &LibcAllocator) };
    Ok(names)
}

fn remove(name: &str) -> Result<()> {
    let cname = c_name(name)?;
    check("delete", unsafe { NativeIO_Delete(cname.as_ptr()) })
        .with_context(|| format!("deleting {:?}", name))?;
    Ok(())
}

fn cat(name: &str) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    with_open(name, |fd| {
        let length = check("getlength", NativeIO_GetLength(fd))?;
        let mut buf = vec![0u8; CHUNK];
        let mut offset = 0i64;
        while offset < i64::from(length) {
            let n = read_at(fd, &mut buf, offset)?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
            offset += i64::try_from(n)?;
        }
        Ok(())
    })?;
    out.flush()?;
    Ok(())
}

fn demo(name: &str) -> Result<()> {
    with_open(name, |fd| {
        let written = write_at(fd, &[1u8; 10], 4)?;
        println!("wrote {} bytes at offset 4", written);
        println!("length is now {}", check("getlength", NativeIO_GetLength(fd))?);

        let mut buf = [0u8; 6];
        let read = read_at(fd, &mut buf, 0)?;
        println!("read {} bytes at offset 0: {:?}", read, &buf[..read]);

        check("flush", NativeIO_Flush(fd))?;
        Ok(())
    })?;

    println!("fileset: {:?}", list()?);
    remove(name)?;
    println!("deleted {:?}", name);
    Ok(())
}
